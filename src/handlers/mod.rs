//! HTTP 处理器模块

pub mod audits;
pub mod compliance;
pub mod health;
pub mod remediation;
pub mod reports;
