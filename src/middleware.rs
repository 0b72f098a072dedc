//! HTTP 中间件
//! 应用状态与请求追踪

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::Result;
use crate::repository::AuditStore;
use crate::services::{
    AuditEngine, AuditService, HistoryService, RemediationService, ReportService,
};
use crate::snow::ServiceNowClient;

/// 应用状态
///
/// 服务用 Arc 包装，多个请求共享同一实例，Clone 仅拷贝指针。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub snow_client: Arc<ServiceNowClient>,
    pub audit_service: Arc<AuditService>,
    pub remediation_service: Arc<RemediationService>,
    pub history_service: Arc<HistoryService>,
    pub report_service: Arc<ReportService>,
}

impl AppState {
    /// 由配置装配全部服务
    ///
    /// 配置对象在进程启动时构造一次，此后只读注入，
    /// 不存在全局可变状态。
    pub async fn from_config(config: AppConfig) -> Result<Arc<AppState>> {
        let snow_client = Arc::new(ServiceNowClient::from_config(&config.servicenow)?);
        let store = AuditStore::new(&config.audit.storage_path);
        store.ensure_dirs().await?;

        let engine = Arc::new(AuditEngine::new(snow_client.clone(), config.audit.clone()));
        let audit_service = Arc::new(AuditService::new(engine.clone(), store.clone()));
        let remediation_service = Arc::new(RemediationService::new(engine, store.clone()));
        let history_service = Arc::new(HistoryService::new(store));
        let report_service = Arc::new(ReportService::new(audit_service.clone()));

        Ok(Arc::new(AppState {
            config,
            snow_client,
            audit_service,
            remediation_service,
            history_service,
            report_service,
        }))
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();
        let response = next.run(req).await;
        let elapsed = start.elapsed();

        let status = response.status().as_u16();
        metrics::counter!("http_requests_total").increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        let mut response = response;
        response
            .headers_mut()
            .insert("x-trace-id", trace_id.parse().unwrap());
        response
            .headers_mut()
            .insert("x-request-id", request_id.parse().unwrap());

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
