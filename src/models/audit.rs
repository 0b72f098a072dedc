//! 审计结果模型
//! 一次审计运行的完整结果与合规评分

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::check::CheckOutcome;

/// 审计类型（三个领域 + 合并审计）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditType {
    Cmdb,
    Discovery,
    Asset,
    Full,
}

impl std::fmt::Display for AuditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditType::Cmdb => write!(f, "cmdb"),
            AuditType::Discovery => write!(f, "discovery"),
            AuditType::Asset => write!(f, "asset"),
            AuditType::Full => write!(f, "full"),
        }
    }
}

/// 审计运行状态
///
/// 任一检查执行完毕后即为终态之一：
/// 有 error → completed_with_errors，有 fail → completed，否则 passed。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditRunStatus {
    Running,
    Passed,
    Completed,
    CompletedWithErrors,
}

/// 合规评分（一经计算不可变）
///
/// 各分项均在 [0, 100]，按严重级别加权汇总。
/// 某级别没有可评分检查时该级别计 100 分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceScore {
    pub overall_score: f64,
    pub critical_score: f64,
    pub high_score: f64,
    pub medium_score: f64,
    pub low_score: f64,
    pub passed_count: u64,
    pub failed_count: u64,
    pub total_count: u64,
}

/// 一次审计运行的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub id: Uuid,
    pub audit_type: AuditType,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// 检查结果，顺序即执行顺序
    pub checks: Vec<CheckOutcome>,
    /// 运行中为 None
    pub score: Option<ComplianceScore>,
    pub status: AuditRunStatus,
    /// 派生字段，可由 checks 重新计算
    pub summary: String,
}

impl AuditResult {
    /// 创建一个运行中的审计结果
    pub fn started(audit_type: AuditType) -> Self {
        Self {
            id: Uuid::new_v4(),
            audit_type,
            started_at: Utc::now(),
            completed_at: None,
            checks: Vec::new(),
            score: None,
            status: AuditRunStatus::Running,
            summary: String::new(),
        }
    }

    /// 失败检查的名称集合（用于审计间对比）
    pub fn failed_check_names(&self) -> std::collections::BTreeSet<String> {
        self.checks
            .iter()
            .filter(|c| c.status == super::check::CheckStatus::Fail)
            .map(|c| c.name.clone())
            .collect()
    }
}

/// 历史列表中的审计摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    pub id: Uuid,
    pub audit_type: AuditType,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: AuditRunStatus,
    pub overall_score: Option<f64>,
}

impl From<&AuditResult> for AuditSummary {
    fn from(result: &AuditResult) -> Self {
        Self {
            id: result.id,
            audit_type: result.audit_type,
            started_at: result.started_at,
            completed_at: result.completed_at,
            status: result.status,
            overall_score: result.score.as_ref().map(|s| s.overall_score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::check::{CheckStatus, Severity};

    #[test]
    fn test_started_result_is_running_without_score() {
        let result = AuditResult::started(AuditType::Cmdb);
        assert_eq!(result.status, AuditRunStatus::Running);
        assert!(result.score.is_none());
        assert!(result.completed_at.is_none());
    }

    #[test]
    fn test_failed_check_names() {
        let mut result = AuditResult::started(AuditType::Full);
        result.checks = vec![
            CheckOutcome::new("a", "d", Severity::Low, CheckStatus::Pass, String::new()),
            CheckOutcome::new("b", "d", Severity::High, CheckStatus::Fail, String::new()),
            CheckOutcome::new("c", "d", Severity::Medium, CheckStatus::Error, String::new()),
        ];
        let failed = result.failed_check_names();
        assert_eq!(failed.len(), 1);
        assert!(failed.contains("b"));
    }

    #[test]
    fn test_audit_type_serde() {
        let json = serde_json::to_string(&AuditType::Full).unwrap();
        assert_eq!(json, "\"full\"");
        let status: AuditRunStatus = serde_json::from_str("\"completed_with_errors\"").unwrap();
        assert_eq!(status, AuditRunStatus::CompletedWithErrors);
    }
}
