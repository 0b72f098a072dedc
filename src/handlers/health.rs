//! 健康检查处理器
//! 存活探针与 ServiceNow 连通性探测

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::middleware::AppState;

/// 健康检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: Vec<HealthCheck>,
}

/// 健康检查项
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 健康检查
/// 探测 ServiceNow 连通性；失败时返回降级状态而非错误
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snow_check = match state.snow_client.ping().await {
        Ok(()) => HealthCheck {
            name: "servicenow".to_string(),
            status: "healthy".to_string(),
            message: None,
        },
        Err(err) => HealthCheck {
            name: "servicenow".to_string(),
            status: "unhealthy".to_string(),
            message: Some(err.user_message()),
        },
    };

    let all_healthy = snow_check.status == "healthy";
    Json(HealthResponse {
        status: if all_healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: vec![snow_check],
    })
}
