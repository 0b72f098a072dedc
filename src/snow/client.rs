//! ServiceNow REST 客户端
//! Table API 查询，瞬时错误按指数退避自动重试

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ServiceNowConfig;
use crate::error::{AppError, Result};
use crate::snow::record::Record;

/// Table API 响应体
#[derive(Debug, Deserialize)]
struct TableResponse {
    #[serde(default)]
    result: Vec<Record>,
}

/// ServiceNow Table API 客户端
///
/// 只读访问：所有检查函数通过 get_records 发起有界查询。
pub struct ServiceNowClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: Secret<String>,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl ServiceNowClient {
    /// 根据配置构建客户端
    pub fn from_config(config: &ServiceNowConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.instance_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    /// 查询表记录
    ///
    /// fields 为空时返回全部字段；query 为 ServiceNow 编码查询串；
    /// limit 限定返回的最大记录数（采样查询，不做穷举扫描）。
    pub async fn get_records(
        &self,
        table: &str,
        fields: &[&str],
        query: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Record>> {
        let url = format!("{}/api/now/table/{}", self.base_url, table);

        let mut params: Vec<(&str, String)> = vec![
            ("sysparm_limit", limit.to_string()),
            ("sysparm_exclude_reference_link", "true".to_string()),
        ];
        if !fields.is_empty() {
            params.push(("sysparm_fields", fields.join(",")));
        }
        if let Some(q) = query {
            params.push(("sysparm_query", q.to_string()));
        }

        let mut attempt = 0;
        loop {
            let result = self.execute(table, &url, &params).await;
            match result {
                Ok(records) => return Ok(records),
                Err(err) if is_transient(&err) && attempt < self.max_retries => {
                    let backoff = self.backoff_delay(attempt, &err);
                    warn!(
                        table,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Transient ServiceNow error, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// 连通性检查：查询 sys_properties 一条记录
    pub async fn ping(&self) -> Result<()> {
        self.get_records("sys_properties", &["sys_id"], None, 1)
            .await?;
        Ok(())
    }

    async fn execute(
        &self,
        table: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<Record>> {
        let response = self
            .client
            .get(url)
            .query(params)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => Err(AppError::Authentication(format!(
                "401 from {} query",
                table
            ))),
            StatusCode::FORBIDDEN => Err(AppError::PermissionDenied(format!(
                "403 from {} query",
                table
            ))),
            StatusCode::NOT_FOUND => Err(AppError::not_found(&format!("table {}", table))),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                Err(AppError::RateLimited { retry_after })
            }
            s if s.is_server_error() => Err(AppError::Api {
                status: Some(s.as_u16()),
                message: format!("server error from {} query", table),
            }),
            s if !s.is_success() => Err(AppError::Api {
                status: Some(s.as_u16()),
                message: format!("unexpected status from {} query", table),
            }),
            _ => {
                let body: TableResponse = response.json().await.map_err(|e| AppError::Api {
                    status: Some(status.as_u16()),
                    message: format!("malformed response from {}: {}", table, e),
                })?;
                debug!(table, count = body.result.len(), "ServiceNow query ok");
                Ok(body.result)
            }
        }
    }

    /// 退避时长：基准 * 2^attempt，限流响应优先使用 Retry-After
    fn backoff_delay(&self, attempt: u32, err: &AppError) -> Duration {
        if let AppError::RateLimited {
            retry_after: Some(secs),
        } = err
        {
            return Duration::from_secs(*secs);
        }
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(1 << attempt))
    }
}

/// 是否为可重试的瞬时错误
fn is_transient(err: &AppError) -> bool {
    matches!(
        err,
        AppError::Connection(_)
            | AppError::RateLimited { .. }
            | AppError::Api {
                status: Some(500..=599),
                ..
            }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&AppError::Connection("refused".into())));
        assert!(is_transient(&AppError::RateLimited { retry_after: None }));
        assert!(is_transient(&AppError::Api {
            status: Some(503),
            message: "down".into()
        }));
        assert!(!is_transient(&AppError::Authentication("401".into())));
        assert!(!is_transient(&AppError::PermissionDenied("403".into())));
        assert!(!is_transient(&AppError::not_found("table x")));
        assert!(!is_transient(&AppError::Api {
            status: Some(400),
            message: "bad".into()
        }));
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let config = ServiceNowConfig {
            instance_url: "https://x.service-now.com".into(),
            username: "u".into(),
            password: Secret::new("p".into()),
            timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 500,
        };
        let client = ServiceNowClient::from_config(&config).unwrap();
        let err = AppError::Connection("refused".into());
        assert_eq!(client.backoff_delay(0, &err), Duration::from_millis(500));
        assert_eq!(client.backoff_delay(1, &err), Duration::from_millis(1000));
        assert_eq!(client.backoff_delay(2, &err), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_honors_retry_after() {
        let config = ServiceNowConfig {
            instance_url: "https://x.service-now.com".into(),
            username: "u".into(),
            password: Secret::new("p".into()),
            timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 500,
        };
        let client = ServiceNowClient::from_config(&config).unwrap();
        let err = AppError::RateLimited {
            retry_after: Some(7),
        };
        assert_eq!(client.backoff_delay(0, &err), Duration::from_secs(7));
    }

    #[test]
    fn test_table_response_parses_result() {
        let body = r#"{"result": [{"sys_id": "a"}, {"sys_id": "b"}]}"#;
        let parsed: TableResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.result.len(), 2);
        assert_eq!(parsed.result[0].get_str("sys_id"), "a");
    }
}
