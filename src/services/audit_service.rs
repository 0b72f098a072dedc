//! 审计编排
//! 按领域组装检查清单，运行引擎并持久化结果

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AuditResult, AuditType, Severity};
use crate::repository::AuditStore;
use crate::services::checks::{CheckId, ASSET_CHECKS, CMDB_CHECKS, DISCOVERY_CHECKS};
use crate::services::engine::AuditEngine;

/// 审计服务：引擎之上的持久化编排层
pub struct AuditService {
    engine: Arc<AuditEngine>,
    store: AuditStore,
}

impl AuditService {
    pub fn new(engine: Arc<AuditEngine>, store: AuditStore) -> Self {
        Self { engine, store }
    }

    /// CMDB 审计，可按严重级别过滤检查
    ///
    /// 过滤无匹配时退回全部检查，不产出空审计。
    pub async fn run_cmdb_audit(
        &self,
        severity_filter: Option<Severity>,
    ) -> Result<AuditResult> {
        let mut check_list: Vec<CheckId> = CMDB_CHECKS.to_vec();
        if let Some(severity) = severity_filter {
            let filtered: Vec<CheckId> = check_list
                .iter()
                .copied()
                .filter(|c| c.severity() == severity)
                .collect();
            if !filtered.is_empty() {
                check_list = filtered;
            } else {
                info!(?severity, "Severity filter matched no checks, running all");
            }
        }
        self.run_and_persist(AuditType::Cmdb, &check_list).await
    }

    pub async fn run_discovery_audit(&self) -> Result<AuditResult> {
        self.run_and_persist(AuditType::Discovery, &DISCOVERY_CHECKS)
            .await
    }

    pub async fn run_asset_audit(&self) -> Result<AuditResult> {
        self.run_and_persist(AuditType::Asset, &ASSET_CHECKS).await
    }

    /// 合并审计：三个领域的检查按稳定顺序串接后由引擎统一执行，
    /// 只持久化一条结果
    pub async fn run_full_audit(&self) -> Result<AuditResult> {
        self.run_and_persist(AuditType::Full, &CheckId::all()).await
    }

    pub async fn get_audit(&self, id: Uuid) -> Result<AuditResult> {
        self.store.load_audit(id).await
    }

    async fn run_and_persist(
        &self,
        audit_type: AuditType,
        check_list: &[CheckId],
    ) -> Result<AuditResult> {
        let result = self.engine.run_audit(audit_type, check_list).await;
        self.store.save_audit(&result).await?;
        Ok(result)
    }
}
