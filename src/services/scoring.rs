//! 合规评分
//! 按严重级别加权的通过率，0-100

use crate::models::{CheckOutcome, ComplianceScore, Severity};

/// 四个严重级别的固定权重，总和恰为 1.0
///
/// 权重反映运维风险而非检查数量：一个失败的 critical 检查
/// 对总分的影响必须大于多个失败的 low 检查。
pub const SEVERITY_WEIGHTS: [(Severity, f64); 4] = [
    (Severity::Critical, 0.4),
    (Severity::High, 0.3),
    (Severity::Medium, 0.2),
    (Severity::Low, 0.1),
];

/// 合规评分器
#[derive(Debug, Default, Clone)]
pub struct ComplianceScorer;

impl ComplianceScorer {
    pub fn new() -> Self {
        Self
    }

    /// 由检查结果列表计算加权合规评分
    ///
    /// skip/error 状态不参与评分（表示未作判断，而非不合规）。
    /// 某级别没有可评分检查时该级别计 100 分；
    /// 空列表得总分 100（无证据不构成不合规）。
    pub fn calculate_score(&self, checks: &[CheckOutcome]) -> ComplianceScore {
        let mut tier_scores = [100.0_f64; 4];
        let mut total_passed = 0u64;
        let mut total_failed = 0u64;

        let mut overall = 0.0;
        for (idx, (severity, weight)) in SEVERITY_WEIGHTS.iter().enumerate() {
            let tier: Vec<&CheckOutcome> = checks
                .iter()
                .filter(|c| c.severity == *severity && c.status.is_scoreable())
                .collect();

            if !tier.is_empty() {
                let passed = tier
                    .iter()
                    .filter(|c| c.status == crate::models::CheckStatus::Pass)
                    .count() as u64;
                let failed = tier.len() as u64 - passed;
                tier_scores[idx] = passed as f64 / tier.len() as f64 * 100.0;
                total_passed += passed;
                total_failed += failed;
            }

            overall += tier_scores[idx] * weight;
        }

        ComplianceScore {
            overall_score: round2(overall),
            critical_score: round2(tier_scores[0]),
            high_score: round2(tier_scores[1]),
            medium_score: round2(tier_scores[2]),
            low_score: round2(tier_scores[3]),
            passed_count: total_passed,
            failed_count: total_failed,
            total_count: total_passed + total_failed,
        }
    }
}

/// 保留两位小数
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
