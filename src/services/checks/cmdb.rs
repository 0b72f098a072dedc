//! CMDB 健康检查
//! 孤儿 CI、过期记录、重复检测、必填字段缺失
//!
//! 本领域为比率阈值型检查：先查总体、再查违规子集，
//! 违规比率超过策略阈值才判失败。所有查询受 sample_limit
//! 约束，属于采样近似而非穷举审计。

use chrono::{Duration, Utc};
use std::collections::BTreeMap;

use crate::config::AuditSettings;
use crate::error::Result;
use crate::models::{CheckOutcome, CheckStatus};
use crate::snow::ServiceNowClient;

use super::{violation_rate, CheckId};

/// 检测无任何关系的 CI（采样）
///
/// 对每条采样 CI 在 cmdb_rel_ci 上做存在性查询（parent 或 child
/// 任一端），零匹配即为孤儿。受外层采样上限约束，结果是近似值。
pub async fn check_orphan_cis(
    client: &ServiceNowClient,
    settings: &AuditSettings,
) -> Result<CheckOutcome> {
    let check = CheckId::OrphanCis;
    let cis = client
        .get_records(
            "cmdb_ci",
            &["sys_id", "name", "sys_class_name"],
            None,
            settings.sample_limit,
        )
        .await?;

    if cis.is_empty() {
        return Ok(CheckOutcome::new(
            check.name(),
            check.description(),
            check.severity(),
            CheckStatus::Pass,
            "No CIs found to check".to_string(),
        ));
    }

    let mut orphan_ids: Vec<String> = Vec::new();
    for ci in &cis {
        let sys_id = ci.get_str("sys_id");
        if sys_id.is_empty() {
            continue;
        }
        let rels = client
            .get_records(
                "cmdb_rel_ci",
                &["sys_id"],
                Some(&format!("parent={}^ORchild={}", sys_id, sys_id)),
                1,
            )
            .await?;
        if rels.is_empty() {
            orphan_ids.push(sys_id.to_string());
        }
    }

    let rate = violation_rate(orphan_ids.len(), cis.len());
    let status = if rate > settings.orphan_rate_threshold {
        CheckStatus::Fail
    } else {
        CheckStatus::Pass
    };
    let details = format!(
        "{} of {} sampled CIs have no relationships ({:.1}% orphan rate, threshold {:.0}%)",
        orphan_ids.len(),
        cis.len(),
        rate * 100.0,
        settings.orphan_rate_threshold * 100.0
    );
    let count = orphan_ids.len() as u64;

    Ok(
        CheckOutcome::new(check.name(), check.description(), check.severity(), status, details)
            .with_affected(count, orphan_ids),
    )
}

/// 检测长期未更新的 CI
pub async fn check_stale_records(
    client: &ServiceNowClient,
    settings: &AuditSettings,
) -> Result<CheckOutcome> {
    let check = CheckId::StaleRecords;
    let cutoff = Utc::now() - Duration::days(settings.stale_ci_days);
    let cutoff_str = cutoff.format("%Y-%m-%d").to_string();

    let total = client
        .get_records("cmdb_ci", &["sys_id"], None, settings.sample_limit)
        .await?;
    let stale = client
        .get_records(
            "cmdb_ci",
            &["sys_id", "name", "sys_updated_on"],
            Some(&format!("sys_updated_on<{}", cutoff_str)),
            settings.sample_limit,
        )
        .await?;

    let rate = violation_rate(stale.len(), total.len());
    let status = if rate > settings.stale_rate_threshold {
        CheckStatus::Fail
    } else {
        CheckStatus::Pass
    };
    let affected_ids: Vec<String> = stale
        .iter()
        .map(|r| r.get_str("sys_id").to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let details = format!(
        "{} of {} sampled CIs not updated since {} ({:.1}% stale rate, threshold {:.0}%)",
        stale.len(),
        total.len(),
        cutoff_str,
        rate * 100.0,
        settings.stale_rate_threshold * 100.0
    );
    let count = stale.len() as u64;

    Ok(
        CheckOutcome::new(check.name(), check.description(), check.severity(), status, details)
            .with_affected(count, affected_ids),
    )
}

/// 检测同名同类的疑似重复 CI
///
/// 按 name + sys_class_name 组合键分组，任一分组 ≥2 条即为重复组；
/// 受影响记录为所有重复组成员的并集。
pub async fn check_duplicate_cis(
    client: &ServiceNowClient,
    settings: &AuditSettings,
) -> Result<CheckOutcome> {
    let check = CheckId::DuplicateCis;
    let cis = client
        .get_records(
            "cmdb_ci",
            &["sys_id", "name", "sys_class_name"],
            Some("ORDERBYname"),
            settings.sample_limit,
        )
        .await?;

    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for ci in &cis {
        let name = ci.get_str("name");
        let class = ci.get_str("sys_class_name");
        if name.is_empty() && class.is_empty() {
            continue;
        }
        groups
            .entry(format!("{}|{}", name, class))
            .or_default()
            .push(ci.get_str("sys_id").to_string());
    }

    let duplicate_groups: Vec<&Vec<String>> =
        groups.values().filter(|members| members.len() > 1).collect();
    let affected_ids: Vec<String> = duplicate_groups
        .iter()
        .flat_map(|members| members.iter().cloned())
        .filter(|id| !id.is_empty())
        .collect();

    let rate = violation_rate(duplicate_groups.len(), cis.len());
    let status = if rate > settings.duplicate_rate_threshold {
        CheckStatus::Fail
    } else {
        CheckStatus::Pass
    };
    let details = format!(
        "{} potential duplicate groups across {} CIs in {} sampled ({:.1}% group rate, threshold {:.0}%)",
        duplicate_groups.len(),
        affected_ids.len(),
        cis.len(),
        rate * 100.0,
        settings.duplicate_rate_threshold * 100.0
    );
    let count = affected_ids.len() as u64;

    Ok(
        CheckOutcome::new(check.name(), check.description(), check.severity(), status, details)
            .with_affected(count, affected_ids),
    )
}

/// 检测缺失 IP 地址的服务器 CI
pub async fn check_missing_ip_address(
    client: &ServiceNowClient,
    settings: &AuditSettings,
) -> Result<CheckOutcome> {
    let check = CheckId::MissingIpAddress;
    let total = client
        .get_records("cmdb_ci_server", &["sys_id"], None, settings.sample_limit)
        .await?;
    let missing = client
        .get_records(
            "cmdb_ci_server",
            &["sys_id", "name", "ip_address"],
            Some("ip_addressISEMPTY"),
            settings.sample_limit,
        )
        .await?;

    let rate = violation_rate(missing.len(), total.len());
    let status = if rate > settings.missing_field_rate_threshold {
        CheckStatus::Fail
    } else {
        CheckStatus::Pass
    };
    let affected_ids: Vec<String> = missing
        .iter()
        .map(|r| r.get_str("sys_id").to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let details = format!(
        "{} of {} sampled server CIs have no IP address ({:.1}% missing rate, threshold {:.0}%)",
        missing.len(),
        total.len(),
        rate * 100.0,
        settings.missing_field_rate_threshold * 100.0
    );
    let count = missing.len() as u64;

    Ok(
        CheckOutcome::new(check.name(), check.description(), check.severity(), status, details)
            .with_affected(count, affected_ids),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    // 检查的比率与分组逻辑在此验证；对外查询依赖注册表层的
    // 统一 violation_rate 语义（0/0 通过），见 checks::tests。

    #[test]
    fn test_duplicate_grouping_logic() {
        // 分组规则本身是纯逻辑，直接按组合键验证
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (sys_id, name, class) in [
            ("a", "web01", "cmdb_ci_server"),
            ("b", "web01", "cmdb_ci_server"),
            ("c", "db01", "cmdb_ci_server"),
        ] {
            groups
                .entry(format!("{}|{}", name, class))
                .or_default()
                .push(sys_id.to_string());
        }
        let dupes: Vec<_> = groups.values().filter(|m| m.len() > 1).collect();
        assert_eq!(dupes.len(), 1);
        assert_eq!(dupes[0].len(), 2);
    }

    #[test]
    fn test_severity_constants() {
        assert_eq!(CheckId::OrphanCis.severity(), Severity::Medium);
        assert_eq!(CheckId::StaleRecords.severity(), Severity::High);
        assert_eq!(CheckId::DuplicateCis.severity(), Severity::High);
        assert_eq!(CheckId::MissingIpAddress.severity(), Severity::Critical);
    }
}
