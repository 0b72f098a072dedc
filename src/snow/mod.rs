//! ServiceNow Table API 客户端

pub mod client;
pub mod record;

pub use client::ServiceNowClient;
pub use record::Record;
