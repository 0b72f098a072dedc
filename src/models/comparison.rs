//! 审计对比模型
//! 两次审计快照之间的评分差值与发现集合差异

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::AuditResult;

/// 评分趋势
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

/// 两次审计的对比结果
///
/// new/resolved/persistent 三个集合两两不相交，
/// 其并集等于两侧失败检查名的并集。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditComparison {
    pub first_id: Uuid,
    pub second_id: Uuid,
    pub first_score: f64,
    pub second_score: f64,
    pub score_delta: f64,
    pub trend: Trend,
    pub new_findings: Vec<String>,
    pub resolved_findings: Vec<String>,
    pub persistent_findings: Vec<String>,
    pub first_checks_count: usize,
    pub second_checks_count: usize,
}

impl AuditComparison {
    /// 纯函数：由两个已加载的审计结果计算对比
    pub fn between(first: &AuditResult, second: &AuditResult) -> Self {
        let first_score = first
            .score
            .as_ref()
            .map(|s| s.overall_score)
            .unwrap_or(0.0);
        let second_score = second
            .score
            .as_ref()
            .map(|s| s.overall_score)
            .unwrap_or(0.0);
        let score_delta = ((second_score - first_score) * 100.0).round() / 100.0;

        let trend = if score_delta > 0.0 {
            Trend::Improving
        } else if score_delta < 0.0 {
            Trend::Declining
        } else {
            Trend::Stable
        };

        let failed_first = first.failed_check_names();
        let failed_second = second.failed_check_names();

        // BTreeSet 差集/交集天然有序
        let new_findings = failed_second.difference(&failed_first).cloned().collect();
        let resolved_findings = failed_first.difference(&failed_second).cloned().collect();
        let persistent_findings = failed_first
            .intersection(&failed_second)
            .cloned()
            .collect();

        Self {
            first_id: first.id,
            second_id: second.id,
            first_score,
            second_score,
            score_delta,
            trend,
            new_findings,
            resolved_findings,
            persistent_findings,
            first_checks_count: first.checks.len(),
            second_checks_count: second.checks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::AuditType;
    use crate::models::check::{CheckOutcome, CheckStatus, Severity};
    use std::collections::BTreeSet;

    fn audit_with_failures(names: &[&str], score: f64) -> AuditResult {
        let mut result = AuditResult::started(AuditType::Full);
        result.checks = names
            .iter()
            .map(|n| CheckOutcome::new(n, "d", Severity::High, CheckStatus::Fail, String::new()))
            .collect();
        result.score = Some(crate::models::audit::ComplianceScore {
            overall_score: score,
            critical_score: 100.0,
            high_score: score,
            medium_score: 100.0,
            low_score: 100.0,
            passed_count: 0,
            failed_count: names.len() as u64,
            total_count: names.len() as u64,
        });
        result
    }

    #[test]
    fn test_comparison_sets_disjoint_and_complete() {
        let a = audit_with_failures(&["x", "y"], 60.0);
        let b = audit_with_failures(&["y", "z"], 70.0);

        let cmp = AuditComparison::between(&a, &b);
        assert_eq!(cmp.new_findings, vec!["z".to_string()]);
        assert_eq!(cmp.resolved_findings, vec!["x".to_string()]);
        assert_eq!(cmp.persistent_findings, vec!["y".to_string()]);

        // 三集合两两不相交，并集为两侧失败名的并集
        let all: BTreeSet<_> = cmp
            .new_findings
            .iter()
            .chain(&cmp.resolved_findings)
            .chain(&cmp.persistent_findings)
            .cloned()
            .collect();
        let expected: BTreeSet<_> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(all, expected);
        assert_eq!(
            cmp.new_findings.len() + cmp.resolved_findings.len() + cmp.persistent_findings.len(),
            all.len()
        );
    }

    #[test]
    fn test_trend_improving() {
        let a = audit_with_failures(&["x"], 50.0);
        let b = audit_with_failures(&[], 80.0);
        let cmp = AuditComparison::between(&a, &b);
        assert_eq!(cmp.trend, Trend::Improving);
        assert_eq!(cmp.score_delta, 30.0);
    }

    #[test]
    fn test_trend_declining() {
        let a = audit_with_failures(&[], 90.0);
        let b = audit_with_failures(&["x"], 70.5);
        let cmp = AuditComparison::between(&a, &b);
        assert_eq!(cmp.trend, Trend::Declining);
        assert_eq!(cmp.score_delta, -19.5);
    }

    #[test]
    fn test_trend_stable() {
        let a = audit_with_failures(&["x"], 75.0);
        let b = audit_with_failures(&["x"], 75.0);
        let cmp = AuditComparison::between(&a, &b);
        assert_eq!(cmp.trend, Trend::Stable);
        assert_eq!(cmp.score_delta, 0.0);
    }

    #[test]
    fn test_missing_score_treated_as_zero() {
        let mut a = audit_with_failures(&[], 0.0);
        a.score = None;
        let b = audit_with_failures(&[], 100.0);
        let cmp = AuditComparison::between(&a, &b);
        assert_eq!(cmp.first_score, 0.0);
        assert_eq!(cmp.score_delta, 100.0);
    }
}
