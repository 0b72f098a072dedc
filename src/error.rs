//! 统一错误模型
//! 定义审计流水线的所有错误类型和错误响应格式

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 应用错误类型
///
/// 上游（ServiceNow）错误、检查执行错误、持久化错误和
/// 调用边界的参数校验错误分别建模，便于按类恢复。
#[derive(Debug, Error)]
pub enum AppError {
    #[error("ServiceNow connection failed: {0}")]
    Connection(String),

    #[error("ServiceNow authentication failed: {0}")]
    Authentication(String),

    #[error("ServiceNow permission denied: {0}")]
    PermissionDenied(String),

    #[error("Rate limited by ServiceNow")]
    RateLimited { retry_after: Option<u64> },

    #[error("ServiceNow API error ({status:?}): {message}")]
    Api { status: Option<u16>, message: String },

    #[error("Check execution error: {0}")]
    CheckExecution(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Connection(_)
            | AppError::Authentication(_)
            | AppError::PermissionDenied(_)
            | AppError::Api { .. } => StatusCode::BAD_GATEWAY,
            AppError::RateLimited { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::CheckExecution(_)
            | AppError::Storage(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Connection(_) => "ServiceNow instance is unreachable".to_string(),
            AppError::Authentication(_) => "ServiceNow authentication failed".to_string(),
            AppError::PermissionDenied(_) => {
                "Insufficient ServiceNow permissions for this query".to_string()
            }
            AppError::RateLimited { retry_after } => match retry_after {
                Some(secs) => format!("ServiceNow rate limit exceeded, retry after {}s", secs),
                None => "ServiceNow rate limit exceeded".to_string(),
            },
            AppError::Api { message, .. } => format!("ServiceNow API error: {}", message),
            AppError::CheckExecution(msg) => format!("Check execution failed: {}", msg),
            AppError::NotFound(msg) => format!("Resource not found: {}", msg),
            AppError::Validation(msg) => msg.clone(),
            AppError::Storage(_) => "Audit storage error occurred".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Internal(msg) => format!("Internal server error: {}", msg),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    // 便捷方法
    pub fn not_found(msg: &str) -> Self {
        AppError::NotFound(msg.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        AppError::Validation(msg.to_string())
    }

    pub fn storage(msg: &str) -> Self {
        AppError::Storage(msg.to_string())
    }

    pub fn internal_error(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

/// 错误响应 DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub request_id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(),
                request_id,
            },
        };

        // 记录错误日志
        tracing::error!(
            code = self.code(),
            message = %self,
            request_id = %error_response.error.request_id,
            "Application error"
        );

        (status, Json(error_response)).into_response()
    }
}

/// 从 reqwest 错误转换：连接/超时归为 Connection，其余归为 API 错误
impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            AppError::Connection(e.to_string())
        } else {
            AppError::Api {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        }
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

/// 从 IO 错误转换（文件存储路径）
impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound(e.to_string())
        } else {
            AppError::Storage(e.to_string())
        }
    }
}
