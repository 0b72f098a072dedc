//! 业务服务层
//! 审计编排、评分、整改、历史对比与报告

pub mod audit_service;
pub mod checks;
pub mod engine;
pub mod history;
pub mod remediation;
pub mod reports;
pub mod scoring;

pub use audit_service::AuditService;
pub use engine::AuditEngine;
pub use history::HistoryService;
pub use remediation::RemediationService;
pub use reports::ReportService;
pub use scoring::ComplianceScorer;
