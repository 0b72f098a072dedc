//! ServiceNow ITOM 合规审计服务库
//! 提供共享类型和工具

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod snow;
pub mod telemetry;
