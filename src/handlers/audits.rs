//! 审计运行与历史的 HTTP 处理器

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    middleware::AppState,
    models::{AuditType, Severity},
};

#[derive(Debug, Deserialize)]
pub struct CmdbAuditQuery {
    pub severity: Option<Severity>,
}

#[derive(Debug, Deserialize, validator::Validate)]
pub struct HistoryQuery {
    pub audit_type: Option<AuditType>,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 500))]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub first: Option<Uuid>,
    pub second: Option<Uuid>,
}

/// 运行 CMDB 审计，可按 severity 过滤检查
pub async fn run_cmdb_audit(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CmdbAuditQuery>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.audit_service.run_cmdb_audit(query.severity).await?;
    Ok(Json(result))
}

/// 运行 Discovery 审计
pub async fn run_discovery_audit(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.audit_service.run_discovery_audit().await?;
    Ok(Json(result))
}

/// 运行资产审计
pub async fn run_asset_audit(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.audit_service.run_asset_audit().await?;
    Ok(Json(result))
}

/// 运行三个领域的合并审计
pub async fn run_full_audit(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.audit_service.run_full_audit().await?;
    Ok(Json(result))
}

/// 审计历史列表，最新在前
pub async fn list_audits(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    query
        .validate()
        .map_err(|e| AppError::validation(&e.to_string()))?;
    let audits = state
        .history_service
        .list(query.audit_type, query.limit)
        .await?;
    let count = audits.len();
    Ok(Json(serde_json::json!({
        "audits": audits,
        "count": count,
    })))
}

/// 按 ID 查询审计结果
pub async fn get_audit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.audit_service.get_audit(id).await?;
    Ok(Json(result))
}

/// 对比两次审计快照
pub async fn compare_audits(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CompareQuery>,
) -> Result<impl IntoResponse, AppError> {
    let first = query
        .first
        .ok_or_else(|| AppError::validation("query parameter 'first' is required"))?;
    let second = query
        .second
        .ok_or_else(|| AppError::validation("query parameter 'second' is required"))?;

    let comparison = state.history_service.compare(first, second).await?;
    Ok(Json(comparison))
}
