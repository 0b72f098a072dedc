//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceNowConfig {
    /// 实例地址，例如 "https://dev12345.service-now.com"
    pub instance_url: String,
    /// Basic Auth 用户名
    pub username: String,
    /// Basic Auth 密码（使用 Secret 包装，防止日志泄露）
    pub password: Secret<String>,
    /// 单次请求超时时间（秒）
    pub timeout_secs: u64,
    /// 瞬时错误的最大重试次数
    pub max_retries: u32,
    /// 重试退避基准（毫秒），按 2^n 指数增长
    pub retry_backoff_ms: u64,
}

/// 审计策略配置
///
/// 阈值检查（orphan/stale/duplicate/missing-field）的比率上限，
/// 以及采样查询的记录数上限。
#[derive(Debug, Clone, Deserialize)]
pub struct AuditSettings {
    /// 审计结果与整改计划的本地存储目录
    pub storage_path: String,
    /// 采样查询的记录数上限
    pub sample_limit: u32,
    /// CI 未更新视为过期的天数
    pub stale_ci_days: i64,
    /// 发现调度未运行视为过期的天数
    pub stale_schedule_days: i64,
    /// 孤儿 CI 比率上限
    pub orphan_rate_threshold: f64,
    /// 过期 CI 比率上限
    pub stale_rate_threshold: f64,
    /// 重复分组比率上限
    pub duplicate_rate_threshold: f64,
    /// 缺失字段比率上限
    pub missing_field_rate_threshold: f64,
    /// 健康环境的最低活跃发现模式数
    pub pattern_min_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub servicenow: ServiceNowConfig,
    pub audit: AuditSettings,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("servicenow.timeout_secs", 30)?
            .set_default("servicenow.max_retries", 3)?
            .set_default("servicenow.retry_backoff_ms", 500)?
            .set_default("audit.storage_path", ".snow-audit")?
            .set_default("audit.sample_limit", 100)?
            .set_default("audit.stale_ci_days", 90)?
            .set_default("audit.stale_schedule_days", 7)?
            .set_default("audit.orphan_rate_threshold", 0.20)?
            .set_default("audit.stale_rate_threshold", 0.10)?
            .set_default("audit.duplicate_rate_threshold", 0.05)?
            .set_default("audit.missing_field_rate_threshold", 0.15)?
            .set_default("audit.pattern_min_count", 5)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?;

        // 从环境变量加载配置（前缀为 SNOW_AUDIT_）
        settings = settings.add_source(
            Environment::with_prefix("SNOW_AUDIT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        // 验证实例地址
        if !self.servicenow.instance_url.starts_with("https://")
            && !self.servicenow.instance_url.starts_with("http://")
        {
            return Err(ConfigError::Message(format!(
                "Invalid ServiceNow instance URL: {}",
                self.servicenow.instance_url
            )));
        }

        if self.servicenow.username.is_empty() {
            return Err(ConfigError::Message(
                "ServiceNow username must not be empty".to_string(),
            ));
        }

        if self.servicenow.password.expose_secret().is_empty() {
            return Err(ConfigError::Message(
                "ServiceNow password must not be empty".to_string(),
            ));
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证采样上限
        if self.audit.sample_limit == 0 || self.audit.sample_limit > 1000 {
            return Err(ConfigError::Message(
                "audit.sample_limit must be between 1 and 1000".to_string(),
            ));
        }

        // 验证比率阈值
        for (name, value) in [
            ("orphan_rate_threshold", self.audit.orphan_rate_threshold),
            ("stale_rate_threshold", self.audit.stale_rate_threshold),
            (
                "duplicate_rate_threshold",
                self.audit.duplicate_rate_threshold,
            ),
            (
                "missing_field_rate_threshold",
                self.audit.missing_field_rate_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Message(format!(
                    "audit.{} must be between 0.0 and 1.0",
                    name
                )));
            }
        }

        if self.audit.stale_ci_days <= 0 || self.audit.stale_schedule_days <= 0 {
            return Err(ConfigError::Message(
                "audit staleness windows must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
