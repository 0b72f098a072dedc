//! 整改计划模型
//! 由审计失败项派生的可执行任务及其进度跟踪

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::check::{Severity, MAX_AFFECTED_IDS};

/// 整改项状态机
///
/// pending → in_progress → done，或 pending → skipped。
/// done/skipped 为终态，不再流转。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    InProgress,
    Done,
    Skipped,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Done | ItemStatus::Skipped)
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "pending"),
            ItemStatus::InProgress => write!(f, "in_progress"),
            ItemStatus::Done => write!(f, "done"),
            ItemStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// 计划状态
///
/// empty 仅在创建时无任何整改项的情况下出现；
/// 所有项 done/skipped 后转为 completed。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Empty,
    Completed,
}

/// 单条整改任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationItem {
    pub id: Uuid,
    /// 回连检查注册表与 CheckOutcome.name 的连接键
    pub check_name: String,
    /// 创建时取自检查的严重级别，此后不随规则变更同步
    pub priority: Severity,
    pub action: String,
    /// 从检查结果拷贝的目标记录 ID（最多 50 条）
    pub target_ids: Vec<String>,
    pub status: ItemStatus,
    /// 由验证流程写入的备注
    #[serde(default)]
    pub notes: String,
}

impl RemediationItem {
    pub fn new(check_name: &str, priority: Severity, action: String, mut target_ids: Vec<String>) -> Self {
        target_ids.truncate(MAX_AFFECTED_IDS);
        Self {
            id: Uuid::new_v4(),
            check_name: check_name.to_string(),
            priority,
            action,
            target_ids,
            status: ItemStatus::Pending,
            notes: String::new(),
        }
    }
}

/// 整改计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationPlan {
    pub id: Uuid,
    /// 外键引用，不拥有审计结果的生命周期
    pub audit_result_id: Uuid,
    /// 按优先级降序（critical → low），同级保持原检查顺序
    pub items: Vec<RemediationItem>,
    pub status: PlanStatus,
    pub progress_pct: f64,
    pub created_at: DateTime<Utc>,
}

impl RemediationPlan {
    /// 创建计划：按优先级稳定排序，无整改项时状态为 empty
    pub fn new(audit_result_id: Uuid, mut items: Vec<RemediationItem>) -> Self {
        items.sort_by_key(|item| item.priority.rank());
        let status = if items.is_empty() {
            PlanStatus::Empty
        } else {
            PlanStatus::Active
        };
        Self {
            id: Uuid::new_v4(),
            audit_result_id,
            items,
            status,
            progress_pct: 0.0,
            created_at: Utc::now(),
        }
    }

    /// 重新计算进度并在全部终态时标记完成
    ///
    /// 百分比分子只计 done：skipped 不算进度，但不阻塞完成。
    pub fn recompute_progress(&mut self) {
        let total = self.items.len();
        let done = self
            .items
            .iter()
            .filter(|i| i.status == ItemStatus::Done)
            .count();
        let skipped = self
            .items
            .iter()
            .filter(|i| i.status == ItemStatus::Skipped)
            .count();

        self.progress_pct = if total > 0 {
            let pct = done as f64 / total as f64 * 100.0;
            (pct * 100.0).round() / 100.0
        } else {
            0.0
        };

        if total > 0 && done + skipped == total {
            self.status = PlanStatus::Completed;
        }
    }
}

/// 进度查询结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub plan_id: Uuid,
    pub audit_result_id: Uuid,
    pub status: PlanStatus,
    pub progress_pct: f64,
    pub total_items: usize,
    pub done: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub skipped: usize,
    pub items: Vec<RemediationItem>,
}

impl ProgressSummary {
    pub fn from_plan(plan: &RemediationPlan) -> Self {
        let count = |status: ItemStatus| plan.items.iter().filter(|i| i.status == status).count();
        Self {
            plan_id: plan.id,
            audit_result_id: plan.audit_result_id,
            status: plan.status,
            progress_pct: plan.progress_pct,
            total_items: plan.items.len(),
            done: count(ItemStatus::Done),
            in_progress: count(ItemStatus::InProgress),
            pending: count(ItemStatus::Pending),
            skipped: count(ItemStatus::Skipped),
            items: plan.items.clone(),
        }
    }
}

/// 单项验证结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub plan_id: Uuid,
    pub item_id: Uuid,
    pub check_name: String,
    pub previous_status: ItemStatus,
    pub new_check_status: crate::models::check::CheckStatus,
    pub is_fixed: bool,
    pub details: String,
}
