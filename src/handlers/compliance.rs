//! 合规规则与最新评分的 HTTP 处理器

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    error::AppError,
    middleware::AppState,
    models::AuditType,
    services::checks::{CheckCategory, CheckId, RuleInfo},
};

#[derive(Debug, Deserialize)]
pub struct RulesQuery {
    pub category: Option<CheckCategory>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    pub audit_type: Option<AuditType>,
}

/// 列出注册表中的全部合规规则，可按领域过滤
pub async fn list_rules(Query(query): Query<RulesQuery>) -> Result<impl IntoResponse, AppError> {
    let rules: Vec<RuleInfo> = CheckId::all()
        .into_iter()
        .filter(|check| match query.category {
            Some(category) => check.category() == category,
            None => true,
        })
        .map(RuleInfo::from)
        .collect();

    let categories: BTreeSet<String> = CheckId::all()
        .into_iter()
        .map(|check| check.category().to_string())
        .collect();

    let count = rules.len();
    Ok(Json(serde_json::json!({
        "rules": rules,
        "count": count,
        "categories": categories,
    })))
}

/// 最近一次审计的合规评分
pub async fn latest_score(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScoreQuery>,
) -> Result<impl IntoResponse, AppError> {
    match state.history_service.latest(query.audit_type).await? {
        Some(summary) => Ok(Json(serde_json::json!({
            "status": "ok",
            "latest": summary,
        }))),
        None => Ok(Json(serde_json::json!({
            "status": "no_data",
            "message": "No audit results stored yet. Run an audit first.",
        }))),
    }
}
