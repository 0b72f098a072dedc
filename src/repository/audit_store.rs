//! 文件存储
//! 审计结果与整改计划以 JSON 文件落盘，按修改时间倒序列表
//!
//! 目录布局：
//!   {storage_path}/history/{audit_id}.json
//!   {storage_path}/remediation/{plan_id}.json
//!
//! 列表扫描时单个损坏文件只告警跳过，不影响其余条目；
//! 按 ID 精确读取时损坏文件是硬错误。

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{AuditResult, AuditSummary, AuditType, RemediationPlan};

const HISTORY_DIR: &str = "history";
const REMEDIATION_DIR: &str = "remediation";

/// 审计存储
#[derive(Debug, Clone)]
pub struct AuditStore {
    base_path: PathBuf,
}

impl AuditStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn history_dir(&self) -> PathBuf {
        self.base_path.join(HISTORY_DIR)
    }

    fn remediation_dir(&self) -> PathBuf {
        self.base_path.join(REMEDIATION_DIR)
    }

    /// 确保存储目录存在，服务启动时调用一次
    pub async fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.history_dir()).await?;
        fs::create_dir_all(self.remediation_dir()).await?;
        debug!(path = %self.base_path.display(), "Audit storage initialized");
        Ok(())
    }

    /// 保存审计结果
    pub async fn save_audit(&self, result: &AuditResult) -> Result<()> {
        self.write_json(&self.history_dir().join(format!("{}.json", result.id)), result)
            .await
    }

    /// 按 ID 读取审计结果
    pub async fn load_audit(&self, id: Uuid) -> Result<AuditResult> {
        let path = self.history_dir().join(format!("{}.json", id));
        self.read_json(&path, &format!("audit result {}", id)).await
    }

    /// 保存整改计划
    pub async fn save_plan(&self, plan: &RemediationPlan) -> Result<()> {
        self.write_json(
            &self.remediation_dir().join(format!("{}.json", plan.id)),
            plan,
        )
        .await
    }

    /// 按 ID 读取整改计划
    pub async fn load_plan(&self, id: Uuid) -> Result<RemediationPlan> {
        let path = self.remediation_dir().join(format!("{}.json", id));
        self.read_json(&path, &format!("remediation plan {}", id))
            .await
    }

    /// 列出审计历史摘要，按修改时间倒序（最新在前）
    ///
    /// audit_type 过滤在截断之前生效；损坏条目跳过并告警。
    pub async fn list_audits(
        &self,
        audit_type: Option<AuditType>,
        limit: usize,
    ) -> Result<Vec<AuditSummary>> {
        let dir = self.history_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<(SystemTime, AuditSummary)> = Vec::new();
        let mut read_dir = fs::read_dir(&dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let modified = entry
                .metadata()
                .await?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);

            let result: AuditResult = match self.try_read_json(&path).await {
                Ok(result) => result,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Skipping unreadable audit entry");
                    continue;
                }
            };
            if let Some(wanted) = audit_type {
                if result.audit_type != wanted {
                    continue;
                }
            }
            entries.push((modified, AuditSummary::from(&result)));
        }

        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries
            .into_iter()
            .take(limit)
            .map(|(_, summary)| summary)
            .collect())
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(value)
            .map_err(|e| AppError::storage(&format!("serialize failed: {}", e)))?;
        fs::write(path, body).await?;
        debug!(path = %path.display(), "Persisted record");
        Ok(())
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &Path,
        what: &str,
    ) -> Result<T> {
        if !path.exists() {
            return Err(AppError::not_found(what));
        }
        self.try_read_json(path).await
    }

    async fn try_read_json<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let body = fs::read(path).await?;
        serde_json::from_slice(&body)
            .map_err(|e| AppError::storage(&format!("corrupt record {}: {}", path.display(), e)))
    }
}
