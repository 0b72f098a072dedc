//! 整改服务
//! 由审计失败项生成计划、跟踪进度、复验修复

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    CheckStatus, ProgressSummary, RemediationItem, RemediationPlan, ValidationOutcome,
};
use crate::repository::AuditStore;
use crate::services::checks::CheckId;
use crate::services::engine::AuditEngine;

/// 整改服务
pub struct RemediationService {
    engine: Arc<AuditEngine>,
    store: AuditStore,
}

impl RemediationService {
    pub fn new(engine: Arc<AuditEngine>, store: AuditStore) -> Self {
        Self { engine, store }
    }

    /// 从一次审计的失败检查派生整改计划
    ///
    /// 仅 status=fail 的检查产生整改项（error/skip 不产生）；
    /// 动作优先取注册表建议，检查名未注册时退回通用文案。
    pub async fn create_plan(&self, audit_id: Uuid) -> Result<RemediationPlan> {
        let result = self.store.load_audit(audit_id).await?;

        let items: Vec<RemediationItem> = result
            .checks
            .iter()
            .filter(|check| check.status == CheckStatus::Fail)
            .map(|check| {
                let action = match CheckId::from_name(&check.name) {
                    Some(registered) => registered.action().to_string(),
                    None => format!("Remediate: {}", check.description),
                };
                RemediationItem::new(
                    &check.name,
                    check.severity,
                    action,
                    check.affected_ids.clone(),
                )
            })
            .collect();

        let plan = RemediationPlan::new(audit_id, items);
        self.store.save_plan(&plan).await?;
        info!(
            plan_id = %plan.id,
            audit_id = %audit_id,
            items = plan.items.len(),
            "Remediation plan created"
        );
        Ok(plan)
    }

    /// 查询计划进度
    ///
    /// 读路径带副作用：每次查询都重算 progress_pct 并回写，
    /// 保证存储中的百分比与整改项状态始终一致。
    pub async fn track_progress(&self, plan_id: Uuid) -> Result<ProgressSummary> {
        let mut plan = self.store.load_plan(plan_id).await?;
        plan.recompute_progress();
        self.store.save_plan(&plan).await?;
        Ok(ProgressSummary::from_plan(&plan))
    }

    /// 复验单个整改项：重跑其来源检查
    ///
    /// 检查通过则整改项转为 done 并记录备注；未通过时只追加
    /// 备注，状态不变。两种情况都重算进度并持久化。
    pub async fn validate_fix(&self, plan_id: Uuid, item_id: Uuid) -> Result<ValidationOutcome> {
        let mut plan = self.store.load_plan(plan_id).await?;

        let item_index = plan
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| {
                AppError::not_found(&format!("item {} in plan {}", item_id, plan_id))
            })?;

        let check_name = plan.items[item_index].check_name.clone();
        let check = CheckId::from_name(&check_name).ok_or_else(|| {
            AppError::validation(&format!("No check registered for {}", check_name))
        })?;

        let previous_status = plan.items[item_index].status;
        let outcome = self.engine.run_check(check).await;
        let is_fixed = outcome.status == CheckStatus::Pass;

        {
            let item = &mut plan.items[item_index];
            if is_fixed {
                item.status = crate::models::ItemStatus::Done;
                item.notes = "Validated: check now passes".to_string();
            } else {
                item.notes = format!("Validation failed: {}", outcome.details);
            }
        }

        plan.recompute_progress();
        self.store.save_plan(&plan).await?;

        info!(
            plan_id = %plan_id,
            item_id = %item_id,
            check = %check_name,
            is_fixed,
            "Fix validation finished"
        );

        Ok(ValidationOutcome {
            plan_id,
            item_id,
            check_name,
            previous_status,
            new_check_status: outcome.status,
            is_fixed,
            details: outcome.details,
        })
    }
}
