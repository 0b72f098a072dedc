//! Discovery 合规检查
//! 调度过期、模式覆盖、CI 对账

use chrono::{Duration, Utc};

use crate::config::AuditSettings;
use crate::error::Result;
use crate::models::{CheckOutcome, CheckStatus};
use crate::snow::ServiceNowClient;

use super::CheckId;

/// 检测长期未运行的活跃发现调度（绝对型：存在即失败）
pub async fn check_stale_schedules(
    client: &ServiceNowClient,
    settings: &AuditSettings,
) -> Result<CheckOutcome> {
    let check = CheckId::StaleDiscoverySchedules;
    let cutoff = Utc::now() - Duration::days(settings.stale_schedule_days);
    let cutoff_str = cutoff.format("%Y-%m-%d").to_string();

    let stale = client
        .get_records(
            "discovery_schedule",
            &["sys_id", "name", "last_run_time"],
            Some(&format!("last_run_time<{}^active=true", cutoff_str)),
            settings.sample_limit,
        )
        .await?;

    let affected_ids: Vec<String> = stale
        .iter()
        .map(|r| r.get_str("sys_id").to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let status = if stale.is_empty() {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    let details = format!(
        "{} active discovery schedules have not run since {}",
        stale.len(),
        cutoff_str
    );
    let count = stale.len() as u64;

    Ok(
        CheckOutcome::new(check.name(), check.description(), check.severity(), status, details)
            .with_affected(count, affected_ids),
    )
}

/// 检查活跃发现模式数量是否达到健康下限
pub async fn check_pattern_coverage(
    client: &ServiceNowClient,
    settings: &AuditSettings,
) -> Result<CheckOutcome> {
    let check = CheckId::PatternCoverage;
    let patterns = client
        .get_records(
            "sa_pattern",
            &["sys_id", "name", "active"],
            Some("active=true"),
            settings.sample_limit,
        )
        .await?;

    let count = patterns.len() as u64;
    let status = if count >= settings.pattern_min_count {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    let details = format!(
        "{} active discovery patterns found (threshold: {})",
        count, settings.pattern_min_count
    );

    Ok(
        CheckOutcome::new(check.name(), check.description(), check.severity(), status, details)
            .with_affected(count, Vec::new()),
    )
}

/// 检测没有发现来源的 CI（未对账记录）
pub async fn check_ci_reconciliation(
    client: &ServiceNowClient,
    settings: &AuditSettings,
) -> Result<CheckOutcome> {
    let check = CheckId::CiReconciliation;
    let unreconciled = client
        .get_records(
            "cmdb_ci",
            &["sys_id", "name", "discovery_source"],
            Some("discovery_sourceISEMPTY"),
            settings.sample_limit,
        )
        .await?;

    let affected_ids: Vec<String> = unreconciled
        .iter()
        .map(|r| r.get_str("sys_id").to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let status = if unreconciled.is_empty() {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    let details = format!("{} CIs have no discovery_source set", unreconciled.len());
    let count = unreconciled.len() as u64;

    Ok(
        CheckOutcome::new(check.name(), check.description(), check.severity(), status, details)
            .with_affected(count, affected_ids),
    )
}
