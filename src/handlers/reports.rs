//! 合规报告的 HTTP 处理器

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::AppError, middleware::AppState};

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    /// 省略时跑一次新的合并审计
    pub audit_id: Option<Uuid>,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "json".to_string()
}

/// 生成合规报告
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.format != "json" {
        return Err(AppError::validation(&format!(
            "Unsupported report format '{}', only 'json' is supported",
            request.format
        )));
    }
    let report = state
        .report_service
        .generate(request.audit_id, &request.format)
        .await?;
    Ok(Json(report))
}
