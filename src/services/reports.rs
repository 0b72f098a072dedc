//! 合规报告
//! 由审计结果生成带评级与整改建议的结构化报告

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AuditResult, AuditType, CheckStatus, ComplianceScore, Severity};
use crate::services::audit_service::AuditService;

/// 报告中的单条发现（即一个失败检查）
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub name: String,
    pub description: String,
    pub details: String,
    pub affected_count: u64,
}

/// 按严重级别分组的发现
#[derive(Debug, Clone, Default, Serialize)]
pub struct FindingsBySeverity {
    pub critical: Vec<Finding>,
    pub high: Vec<Finding>,
    pub medium: Vec<Finding>,
    pub low: Vec<Finding>,
}

impl FindingsBySeverity {
    fn total(&self) -> usize {
        self.critical.len() + self.high.len() + self.medium.len() + self.low.len()
    }
}

/// 管理层摘要
#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveSummary {
    pub overall_score: f64,
    pub grade: &'static str,
    pub risk_level: &'static str,
    pub total_checks: usize,
    pub total_findings: usize,
    pub summary: String,
}

/// 完整合规报告
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub audit_id: Uuid,
    pub audit_type: AuditType,
    pub completed_at: Option<DateTime<Utc>>,
    pub executive_summary: ExecutiveSummary,
    pub score: Option<ComplianceScore>,
    pub findings_by_severity: FindingsBySeverity,
    pub recommendations: Vec<String>,
    pub format: String,
}

/// 报告服务
pub struct ReportService {
    audit: Arc<AuditService>,
}

impl ReportService {
    pub fn new(audit: Arc<AuditService>) -> Self {
        Self { audit }
    }

    /// 生成报告：给定 audit_id 则取历史结果，否则跑一次新的合并审计
    pub async fn generate(
        &self,
        audit_id: Option<Uuid>,
        format: &str,
    ) -> Result<ComplianceReport> {
        let result = match audit_id {
            Some(id) => self.audit.get_audit(id).await?,
            None => self.audit.run_full_audit().await?,
        };
        Ok(build_report(&result, format))
    }
}

/// 纯函数：由审计结果组装报告
pub fn build_report(result: &AuditResult, format: &str) -> ComplianceReport {
    let mut findings = FindingsBySeverity::default();
    for check in &result.checks {
        if check.status != CheckStatus::Fail {
            continue;
        }
        let finding = Finding {
            name: check.name.clone(),
            description: check.description.clone(),
            details: check.details.clone(),
            affected_count: check.affected_count,
        };
        match check.severity {
            Severity::Critical => findings.critical.push(finding),
            Severity::High => findings.high.push(finding),
            Severity::Medium => findings.medium.push(finding),
            Severity::Low => findings.low.push(finding),
        }
    }

    let total_findings = findings.total();
    let score_val = result
        .score
        .as_ref()
        .map(|s| s.overall_score)
        .unwrap_or(0.0);
    let (grade, risk_level) = grade_and_risk(score_val);

    let mut recommendations = Vec::new();
    if !findings.critical.is_empty() {
        recommendations.push(format!(
            "Address {} critical finding(s) immediately",
            findings.critical.len()
        ));
    }
    if !findings.high.is_empty() {
        recommendations.push(format!(
            "Prioritize {} high-severity finding(s) within this sprint",
            findings.high.len()
        ));
    }
    if score_val < 75.0 {
        recommendations.push("Schedule a comprehensive remediation review".to_string());
    }
    if total_findings == 0 {
        recommendations
            .push("Maintain current practices and consider expanding audit coverage".to_string());
    }

    ComplianceReport {
        audit_id: result.id,
        audit_type: result.audit_type,
        completed_at: result.completed_at,
        executive_summary: ExecutiveSummary {
            overall_score: score_val,
            grade,
            risk_level,
            total_checks: result.checks.len(),
            total_findings,
            summary: result.summary.clone(),
        },
        score: result.score.clone(),
        findings_by_severity: findings,
        recommendations,
        format: format.to_string(),
    }
}

/// 评级刻度：A≥90 / B≥75 / C≥60 / D≥40 / F，风险级别随评级同步
fn grade_and_risk(score: f64) -> (&'static str, &'static str) {
    if score >= 90.0 {
        ("A", "low")
    } else if score >= 75.0 {
        ("B", "moderate")
    } else if score >= 60.0 {
        ("C", "elevated")
    } else if score >= 40.0 {
        ("D", "high")
    } else {
        ("F", "critical")
    }
}
