//! 审计历史
//! 历史列表与两次快照的对比

use uuid::Uuid;

use crate::error::Result;
use crate::models::{AuditComparison, AuditSummary, AuditType};
use crate::repository::AuditStore;

/// 历史服务
pub struct HistoryService {
    store: AuditStore,
}

impl HistoryService {
    pub fn new(store: AuditStore) -> Self {
        Self { store }
    }

    /// 历史摘要，最新在前
    pub async fn list(
        &self,
        audit_type: Option<AuditType>,
        limit: usize,
    ) -> Result<Vec<AuditSummary>> {
        self.store.list_audits(audit_type, limit).await
    }

    /// 最近一次审计的摘要（合规评分查询用）
    pub async fn latest(&self, audit_type: Option<AuditType>) -> Result<Option<AuditSummary>> {
        Ok(self.store.list_audits(audit_type, 1).await?.pop())
    }

    /// 对比两次审计，任一结果缺失时向上返回 not-found
    pub async fn compare(&self, first: Uuid, second: Uuid) -> Result<AuditComparison> {
        let first_result = self.store.load_audit(first).await?;
        let second_result = self.store.load_audit(second).await?;
        Ok(AuditComparison::between(&first_result, &second_result))
    }
}
