//! 资产合规检查
//! 许可证超配、过保硬件、未分配资产

use chrono::Utc;

use crate::config::AuditSettings;
use crate::error::Result;
use crate::models::{CheckOutcome, CheckStatus};
use crate::snow::ServiceNowClient;

use super::CheckId;

/// 检测安装数超过许可数的许可证
///
/// 数值字段可能是空串或脏数据，无法解析的记录直接跳过，
/// 不计入违规也不报错。
pub async fn check_license_overallocation(
    client: &ServiceNowClient,
    settings: &AuditSettings,
) -> Result<CheckOutcome> {
    let check = CheckId::LicenseOverallocation;
    let licenses = client
        .get_records(
            "alm_license",
            &["sys_id", "display_name", "license_count", "installed_count"],
            None,
            settings.sample_limit,
        )
        .await?;

    let mut overallocated: Vec<String> = Vec::new();
    for license in &licenses {
        let installed: u64 = match license.get_parsed("installed_count") {
            Some(v) => v,
            None => continue,
        };
        let allowed: u64 = match license.get_parsed("license_count") {
            Some(v) => v,
            None => continue,
        };
        if allowed > 0 && installed > allowed {
            let sys_id = license.get_str("sys_id");
            if !sys_id.is_empty() {
                overallocated.push(sys_id.to_string());
            }
        }
    }

    let status = if overallocated.is_empty() {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    let details = format!("{} licenses are over-allocated", overallocated.len());
    let count = overallocated.len() as u64;

    Ok(
        CheckOutcome::new(check.name(), check.description(), check.severity(), status, details)
            .with_affected(count, overallocated),
    )
}

/// 检测超过报废日期的硬件资产
pub async fn check_expired_hardware(
    client: &ServiceNowClient,
    settings: &AuditSettings,
) -> Result<CheckOutcome> {
    let check = CheckId::ExpiredHardware;
    let today_str = Utc::now().format("%Y-%m-%d").to_string();

    let expired = client
        .get_records(
            "alm_hardware",
            &["sys_id", "display_name", "end_of_life"],
            Some(&format!("end_of_life<{}^end_of_lifeISNOTEMPTY", today_str)),
            settings.sample_limit,
        )
        .await?;

    let affected_ids: Vec<String> = expired
        .iter()
        .map(|r| r.get_str("sys_id").to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let status = if expired.is_empty() {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    let details = format!("{} hardware assets have passed end-of-life", expired.len());
    let count = expired.len() as u64;

    Ok(
        CheckOutcome::new(check.name(), check.description(), check.severity(), status, details)
            .with_affected(count, affected_ids),
    )
}

/// 检测无负责人的在用资产
pub async fn check_unassigned_assets(
    client: &ServiceNowClient,
    settings: &AuditSettings,
) -> Result<CheckOutcome> {
    let check = CheckId::UnassignedAssets;
    let unassigned = client
        .get_records(
            "alm_asset",
            &["sys_id", "display_name", "install_status"],
            Some("assigned_toISEMPTY^install_status=1"),
            settings.sample_limit,
        )
        .await?;

    let affected_ids: Vec<String> = unassigned
        .iter()
        .map(|r| r.get_str("sys_id").to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let status = if unassigned.is_empty() {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    let details = format!("{} active assets have no assigned user", unassigned.len());
    let count = unassigned.len() as u64;

    Ok(
        CheckOutcome::new(check.name(), check.description(), check.severity(), status, details)
            .with_affected(count, affected_ids),
    )
}
