//! 检查结果模型
//! 单条合规规则的评估结果

use serde::{Deserialize, Serialize};

/// 受影响记录 ID 列表的上限，防止结果体积失控
pub const MAX_AFFECTED_IDS: usize = 50;

/// 检查严重级别
///
/// 在规则定义时固定，同名检查的级别不可变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// 排序权重：critical 最优先
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// 检查状态
///
/// error 仅由审计引擎的故障隔离包装产生，检查函数本身不返回。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skip,
    Error,
}

impl CheckStatus {
    /// skip/error 表示未作判断，不参与评分
    pub fn is_scoreable(self) -> bool {
        matches!(self, CheckStatus::Pass | CheckStatus::Fail)
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "pass"),
            CheckStatus::Fail => write!(f, "fail"),
            CheckStatus::Skip => write!(f, "skip"),
            CheckStatus::Error => write!(f, "error"),
        }
    }
}

/// 单条检查的评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// 稳定标识符，审计间对比与整改注册表的连接键
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub status: CheckStatus,
    /// 人类可读的说明
    pub details: String,
    #[serde(default)]
    pub affected_count: u64,
    /// 受影响记录 ID（最多 MAX_AFFECTED_IDS 条）
    #[serde(default)]
    pub affected_ids: Vec<String>,
}

impl CheckOutcome {
    pub fn new(
        name: &str,
        description: &str,
        severity: Severity,
        status: CheckStatus,
        details: String,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            severity,
            status,
            details,
            affected_count: 0,
            affected_ids: Vec::new(),
        }
    }

    /// 记录受影响的记录，ID 列表截断至上限
    pub fn with_affected(mut self, count: u64, mut ids: Vec<String>) -> Self {
        ids.truncate(MAX_AFFECTED_IDS);
        self.affected_count = count;
        self.affected_ids = ids;
        self
    }
}
