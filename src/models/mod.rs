//! 审计领域模型

pub mod audit;
pub mod check;
pub mod comparison;
pub mod remediation;

pub use audit::{AuditResult, AuditRunStatus, AuditSummary, AuditType, ComplianceScore};
pub use check::{CheckOutcome, CheckStatus, Severity, MAX_AFFECTED_IDS};
pub use comparison::{AuditComparison, Trend};
pub use remediation::{
    ItemStatus, PlanStatus, ProgressSummary, RemediationItem, RemediationPlan, ValidationOutcome,
};
