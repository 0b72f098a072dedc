//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{handlers, middleware::AppState};

/// 请求体上限（整改/报告请求都很小）
const MAX_BODY_BYTES: usize = 64 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        // 审计运行
        .route("/audits/cmdb", post(handlers::audits::run_cmdb_audit))
        .route(
            "/audits/discovery",
            post(handlers::audits::run_discovery_audit),
        )
        .route("/audits/assets", post(handlers::audits::run_asset_audit))
        .route("/audits/full", post(handlers::audits::run_full_audit))
        // 历史与对比；compare 先于 {id} 注册避免路径吞并
        .route("/audits", get(handlers::audits::list_audits))
        .route("/audits/compare", get(handlers::audits::compare_audits))
        .route("/audits/{id}", get(handlers::audits::get_audit))
        // 合规规则与评分
        .route("/compliance/rules", get(handlers::compliance::list_rules))
        .route("/compliance/score", get(handlers::compliance::latest_score))
        // 整改计划
        .route(
            "/remediation/plans",
            post(handlers::remediation::create_plan),
        )
        .route(
            "/remediation/plans/{id}/progress",
            get(handlers::remediation::get_progress),
        )
        .route(
            "/remediation/plans/{plan_id}/items/{item_id}/validate",
            post(handlers::remediation::validate_item),
        )
        // 报告
        .route("/reports", post(handlers::reports::generate_report))
        // 健康检查
        .route("/health", get(handlers::health::health_check));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(
            crate::middleware::request_tracking_middleware,
        ))
        .with_state(state)
}
