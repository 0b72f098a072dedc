//! 检查注册表
//! 检查名 → (检查函数, 建议整改动作) 的静态映射
//!
//! 以封闭枚举建模：新增检查必须在此注册，编译期即校验完整性。

pub mod assets;
pub mod cmdb;
pub mod discovery;

use serde::{Deserialize, Serialize};

use crate::config::AuditSettings;
use crate::error::Result;
use crate::models::{CheckOutcome, Severity};
use crate::snow::ServiceNowClient;

/// 检查所属领域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Cmdb,
    Discovery,
    Asset,
}

impl std::fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckCategory::Cmdb => write!(f, "cmdb"),
            CheckCategory::Discovery => write!(f, "discovery"),
            CheckCategory::Asset => write!(f, "asset"),
        }
    }
}

/// 全部已注册的合规检查
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    OrphanCis,
    StaleRecords,
    DuplicateCis,
    MissingIpAddress,
    StaleDiscoverySchedules,
    PatternCoverage,
    CiReconciliation,
    LicenseOverallocation,
    ExpiredHardware,
    UnassignedAssets,
}

/// CMDB 领域检查（顺序即执行顺序，跨审计保持稳定）
pub const CMDB_CHECKS: [CheckId; 4] = [
    CheckId::OrphanCis,
    CheckId::StaleRecords,
    CheckId::DuplicateCis,
    CheckId::MissingIpAddress,
];

/// Discovery 领域检查
pub const DISCOVERY_CHECKS: [CheckId; 3] = [
    CheckId::StaleDiscoverySchedules,
    CheckId::PatternCoverage,
    CheckId::CiReconciliation,
];

/// 资产领域检查
pub const ASSET_CHECKS: [CheckId; 3] = [
    CheckId::LicenseOverallocation,
    CheckId::ExpiredHardware,
    CheckId::UnassignedAssets,
];

impl CheckId {
    /// 全部检查，合并审计按此顺序执行（CMDB → Discovery → 资产）
    pub fn all() -> Vec<CheckId> {
        CMDB_CHECKS
            .iter()
            .chain(DISCOVERY_CHECKS.iter())
            .chain(ASSET_CHECKS.iter())
            .copied()
            .collect()
    }

    /// 稳定标识符，作为审计间对比与整改项的连接键
    pub fn name(self) -> &'static str {
        match self {
            CheckId::OrphanCis => "orphan_cis",
            CheckId::StaleRecords => "stale_records",
            CheckId::DuplicateCis => "duplicate_cis",
            CheckId::MissingIpAddress => "missing_ip_address",
            CheckId::StaleDiscoverySchedules => "stale_discovery_schedules",
            CheckId::PatternCoverage => "pattern_coverage",
            CheckId::CiReconciliation => "ci_reconciliation",
            CheckId::LicenseOverallocation => "license_overallocation",
            CheckId::ExpiredHardware => "expired_hardware",
            CheckId::UnassignedAssets => "unassigned_assets",
        }
    }

    /// 按名称反查（整改项验证时使用）
    pub fn from_name(name: &str) -> Option<CheckId> {
        Self::all().into_iter().find(|c| c.name() == name)
    }

    pub fn category(self) -> CheckCategory {
        match self {
            CheckId::OrphanCis
            | CheckId::StaleRecords
            | CheckId::DuplicateCis
            | CheckId::MissingIpAddress => CheckCategory::Cmdb,
            CheckId::StaleDiscoverySchedules
            | CheckId::PatternCoverage
            | CheckId::CiReconciliation => CheckCategory::Discovery,
            CheckId::LicenseOverallocation
            | CheckId::ExpiredHardware
            | CheckId::UnassignedAssets => CheckCategory::Asset,
        }
    }

    /// 规则定义时固定的严重级别，同名检查不可变
    pub fn severity(self) -> Severity {
        match self {
            CheckId::MissingIpAddress | CheckId::LicenseOverallocation => Severity::Critical,
            CheckId::StaleRecords
            | CheckId::DuplicateCis
            | CheckId::StaleDiscoverySchedules
            | CheckId::ExpiredHardware => Severity::High,
            CheckId::OrphanCis | CheckId::PatternCoverage | CheckId::CiReconciliation => {
                Severity::Medium
            }
            CheckId::UnassignedAssets => Severity::Low,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CheckId::OrphanCis => "Detect CIs with no relationships",
            CheckId::StaleRecords => "Detect CIs not updated in 90+ days",
            CheckId::DuplicateCis => "Detect CIs with same name and class",
            CheckId::MissingIpAddress => "Detect server CIs missing IP address",
            CheckId::StaleDiscoverySchedules => "Detect discovery schedules not run in 7+ days",
            CheckId::PatternCoverage => "Check active discovery pattern count",
            CheckId::CiReconciliation => "Detect CIs with no discovery source",
            CheckId::LicenseOverallocation => "Detect licenses exceeding allocated count",
            CheckId::ExpiredHardware => "Detect hardware past end-of-life",
            CheckId::UnassignedAssets => "Detect active assets with no assigned user",
        }
    }

    /// 建议整改动作
    pub fn action(self) -> &'static str {
        match self {
            CheckId::OrphanCis => {
                "Review orphan CIs and either create relationships or decommission"
            }
            CheckId::StaleRecords => {
                "Update stale CI records or mark as retired if no longer valid"
            }
            CheckId::DuplicateCis => "Merge or deduplicate CIs with matching name and class",
            CheckId::MissingIpAddress => {
                "Populate IP address field on server CIs or run discovery"
            }
            CheckId::StaleDiscoverySchedules => "Review and re-enable stale discovery schedules",
            CheckId::PatternCoverage => "Add more discovery patterns to improve coverage",
            CheckId::CiReconciliation => {
                "Run discovery or manually set discovery_source on unreconciled CIs"
            }
            CheckId::LicenseOverallocation => {
                "Reduce installed count or procure additional licenses"
            }
            CheckId::ExpiredHardware => "Plan hardware refresh for end-of-life assets",
            CheckId::UnassignedAssets => "Assign active assets to responsible users or teams",
        }
    }

    /// 执行检查，发起有界查询并返回结构化结果
    pub async fn execute(
        self,
        client: &ServiceNowClient,
        settings: &AuditSettings,
    ) -> Result<CheckOutcome> {
        match self {
            CheckId::OrphanCis => cmdb::check_orphan_cis(client, settings).await,
            CheckId::StaleRecords => cmdb::check_stale_records(client, settings).await,
            CheckId::DuplicateCis => cmdb::check_duplicate_cis(client, settings).await,
            CheckId::MissingIpAddress => cmdb::check_missing_ip_address(client, settings).await,
            CheckId::StaleDiscoverySchedules => {
                discovery::check_stale_schedules(client, settings).await
            }
            CheckId::PatternCoverage => discovery::check_pattern_coverage(client, settings).await,
            CheckId::CiReconciliation => {
                discovery::check_ci_reconciliation(client, settings).await
            }
            CheckId::LicenseOverallocation => {
                assets::check_license_overallocation(client, settings).await
            }
            CheckId::ExpiredHardware => assets::check_expired_hardware(client, settings).await,
            CheckId::UnassignedAssets => assets::check_unassigned_assets(client, settings).await,
        }
    }
}

/// 规则清单条目
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub name: &'static str,
    pub category: CheckCategory,
    pub severity: Severity,
    pub description: &'static str,
}

impl From<CheckId> for RuleInfo {
    fn from(check: CheckId) -> Self {
        Self {
            name: check.name(),
            category: check.category(),
            severity: check.severity(),
            description: check.description(),
        }
    }
}

/// 违规比率；总体为 0 时按 0% 处理（定义为通过）
pub(crate) fn violation_rate(violating: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        violating as f64 / total as f64
    }
}
