//! 整改计划的 HTTP 处理器

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::AppError, middleware::AppState};

#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub audit_id: Uuid,
}

/// 从一次审计的失败项创建整改计划
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let plan = state
        .remediation_service
        .create_plan(request.audit_id)
        .await?;
    Ok(Json(plan))
}

/// 查询计划进度（重算并回写百分比）
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let progress = state.remediation_service.track_progress(plan_id).await?;
    Ok(Json(progress))
}

/// 复验单个整改项
pub async fn validate_item(
    State(state): State<Arc<AppState>>,
    Path((plan_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .remediation_service
        .validate_fix(plan_id, item_id)
        .await?;
    Ok(Json(outcome))
}
