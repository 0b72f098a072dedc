//! 数据访问层
//! 审计历史与整改计划的文件化存储

pub mod audit_store;

pub use audit_store::AuditStore;
