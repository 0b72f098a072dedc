//! 审计引擎
//! 按序执行检查、故障隔离、汇总评分
//!
//! 核心保证：单个检查的失败绝不中断整个审计运行。
//! 检查函数返回的 Err（以及 panic）都被降级为 status=error 的
//! 检查结果，审计照常完成并给出降级而非缺失的结果。

use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::AuditSettings;
use crate::models::{AuditResult, AuditRunStatus, AuditType, CheckOutcome, CheckStatus, Severity};
use crate::services::checks::CheckId;
use crate::services::scoring::ComplianceScorer;
use crate::snow::ServiceNowClient;

/// 审计引擎
pub struct AuditEngine {
    client: Arc<ServiceNowClient>,
    settings: AuditSettings,
    scorer: ComplianceScorer,
}

impl AuditEngine {
    pub fn new(client: Arc<ServiceNowClient>, settings: AuditSettings) -> Self {
        Self {
            client,
            settings,
            scorer: ComplianceScorer::new(),
        }
    }

    /// 安全执行单个检查
    ///
    /// 检查失败（Err 或 panic）时返回 status=error 的结果，
    /// 不向上传播。
    pub async fn run_check(&self, check: CheckId) -> CheckOutcome {
        let fut = check.execute(&self.client, &self.settings);
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                error!(check = check.name(), error = %err, "Check failed");
                metrics::counter!("audit_checks_errored_total").increment(1);
                error_outcome(check, &err.to_string(), format!("{:?}", err))
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "check panicked".to_string());
                error!(check = check.name(), panic = %message, "Check panicked");
                metrics::counter!("audit_checks_errored_total").increment(1);
                error_outcome(check, &message, format!("panic: {}", message))
            }
        }
    }

    /// 运行一次完整审计：按给定顺序同步执行全部检查
    ///
    /// 不做持久化，落盘由调用方（audit_service）负责。
    pub async fn run_audit(&self, audit_type: AuditType, check_list: &[CheckId]) -> AuditResult {
        let mut result = AuditResult::started(audit_type);

        for check in check_list {
            info!(check = check.name(), "Running check");
            let outcome = self.run_check(*check).await;
            result.checks.push(outcome);
        }

        result.score = Some(self.scorer.calculate_score(&result.checks));
        result.completed_at = Some(Utc::now());
        result.summary = summarize(&result.checks);
        result.status = derive_status(&result.checks);

        metrics::counter!("audits_run_total").increment(1);
        info!(
            audit_id = %result.id,
            audit_type = %audit_type,
            status = ?result.status,
            summary = %result.summary,
            "Audit run finished"
        );

        result
    }
}

/// 由引擎的故障隔离包装合成的错误结果
///
/// 固定 severity=medium：执行错误不代表被检对象的风险级别。
fn error_outcome(check: CheckId, message: &str, details: String) -> CheckOutcome {
    CheckOutcome::new(
        check.name(),
        &format!("Check failed with error: {}", message),
        Severity::Medium,
        CheckStatus::Error,
        details,
    )
}

/// 状态推导：error 优先于 fail，否则全部通过
pub fn derive_status(checks: &[CheckOutcome]) -> AuditRunStatus {
    if checks.iter().any(|c| c.status == CheckStatus::Error) {
        AuditRunStatus::CompletedWithErrors
    } else if checks.iter().any(|c| c.status == CheckStatus::Fail) {
        AuditRunStatus::Completed
    } else {
        AuditRunStatus::Passed
    }
}

/// 概要行（派生字段，可由 checks 重新计算）
pub fn summarize(checks: &[CheckOutcome]) -> String {
    let passed = checks.iter().filter(|c| c.status == CheckStatus::Pass).count();
    let failed = checks.iter().filter(|c| c.status == CheckStatus::Fail).count();
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    format!(
        "{} passed, {} failed, {} errors out of {} checks",
        passed,
        failed,
        errors,
        checks.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceNowConfig;
    use secrecy::Secret;

    fn check(severity: Severity, status: CheckStatus) -> CheckOutcome {
        CheckOutcome::new("c", "d", severity, status, String::new())
    }

    fn unreachable_engine() -> AuditEngine {
        // 指向不可达地址且不重试，检查快速落入错误路径
        let config = ServiceNowConfig {
            instance_url: "http://127.0.0.1:1".into(),
            username: "u".into(),
            password: Secret::new("p".into()),
            timeout_secs: 1,
            max_retries: 0,
            retry_backoff_ms: 1,
        };
        let client = Arc::new(ServiceNowClient::from_config(&config).unwrap());
        let settings = AuditSettings {
            storage_path: ".snow-audit".into(),
            sample_limit: 10,
            stale_ci_days: 90,
            stale_schedule_days: 7,
            orphan_rate_threshold: 0.2,
            stale_rate_threshold: 0.1,
            duplicate_rate_threshold: 0.05,
            missing_field_rate_threshold: 0.15,
            pattern_min_count: 5,
        };
        AuditEngine::new(client, settings)
    }

    #[test]
    fn test_status_derivation() {
        assert_eq!(
            derive_status(&[
                check(Severity::High, CheckStatus::Pass),
                check(Severity::Low, CheckStatus::Pass)
            ]),
            AuditRunStatus::Passed
        );
        assert_eq!(
            derive_status(&[
                check(Severity::High, CheckStatus::Pass),
                check(Severity::Low, CheckStatus::Fail)
            ]),
            AuditRunStatus::Completed
        );
        // error 优先于 fail
        assert_eq!(
            derive_status(&[
                check(Severity::High, CheckStatus::Fail),
                check(Severity::Low, CheckStatus::Error)
            ]),
            AuditRunStatus::CompletedWithErrors
        );
        assert_eq!(derive_status(&[]), AuditRunStatus::Passed);
    }

    #[test]
    fn test_summarize_format() {
        let checks = vec![
            check(Severity::High, CheckStatus::Pass),
            check(Severity::High, CheckStatus::Fail),
            check(Severity::Low, CheckStatus::Error),
            check(Severity::Low, CheckStatus::Skip),
        ];
        assert_eq!(summarize(&checks), "1 passed, 1 failed, 1 errors out of 4 checks");
    }

    #[test]
    fn test_error_outcome_shape() {
        let outcome = error_outcome(
            CheckId::StaleRecords,
            "connection refused",
            "full context".into(),
        );
        assert_eq!(outcome.name, "stale_records");
        assert_eq!(outcome.status, CheckStatus::Error);
        assert_eq!(outcome.severity, Severity::Medium);
        assert!(outcome.description.contains("connection refused"));
        assert_eq!(outcome.details, "full context");
    }

    #[tokio::test]
    async fn test_failure_isolation_produces_degraded_result() {
        let engine = unreachable_engine();
        let result = engine
            .run_audit(AuditType::Asset, &[CheckId::UnassignedAssets])
            .await;

        // 检查失败不会让 run_audit 失败，结果是降级而非缺失
        assert_eq!(result.checks.len(), 1);
        assert_eq!(result.checks[0].status, CheckStatus::Error);
        assert_eq!(result.status, AuditRunStatus::CompletedWithErrors);
        assert!(result.completed_at.is_some());
        assert!(result.score.is_some());
        // error 不参与评分
        assert_eq!(result.score.as_ref().unwrap().total_count, 0);
    }

    #[tokio::test]
    async fn test_run_check_isolated() {
        let engine = unreachable_engine();
        let outcome = engine.run_check(CheckId::ExpiredHardware).await;
        assert_eq!(outcome.status, CheckStatus::Error);
        assert_eq!(outcome.name, "expired_hardware");
        assert_eq!(outcome.severity, Severity::Medium);
    }
}
