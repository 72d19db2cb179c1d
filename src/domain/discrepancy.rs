// ==========================================
// 木材理货台账系统 - 差异领域模型
// ==========================================
// 红线: 差异为封闭标签联合,仅可修正变体能够产出修正补丁
// 说明: 差异不作为独立实体持久化,只进入当次对账报告
// ==========================================

use crate::domain::types::{DiscrepancyKind, LotStatus, Severity};
use serde::{Deserialize, Serialize};

// ==========================================
// CorrectionPatch - 单字段修正补丁
// ==========================================
// 红线: 一次修正只写一个字段,不做多字段事务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrectionPatch {
    /// 重写剩余板英尺
    RemainingBf { current: f64, correct: f64 },
    /// 重写批次状态
    Status { current: LotStatus, correct: LotStatus },
}

impl CorrectionPatch {
    /// 被修正字段名（与 tally_lot 列名一致）
    pub fn field_name(&self) -> &'static str {
        match self {
            CorrectionPatch::RemainingBf { .. } => "remaining_bf",
            CorrectionPatch::Status { .. } => "status",
        }
    }

    /// 修正前的值（字符串形式,用于审计记录）
    pub fn current_display(&self) -> String {
        match self {
            CorrectionPatch::RemainingBf { current, .. } => format!("{:.2}", current),
            CorrectionPatch::Status { current, .. } => current.to_string(),
        }
    }

    /// 修正后的值（字符串形式,用于审计记录）
    pub fn correct_display(&self) -> String {
        match self {
            CorrectionPatch::RemainingBf { correct, .. } => format!("{:.2}", correct),
            CorrectionPatch::Status { correct, .. } => correct.to_string(),
        }
    }
}

// ==========================================
// DiscrepancyDetail - 差异明细(按类型携带字段)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyDetail {
    /// 余额不一致: 记录余额与按分配记录推算的余额偏差超出容差
    BalanceMismatch {
        recorded_remaining_bf: f64,
        calculated_remaining_bf: f64,
        variance_bf: f64,
    },
    /// 负数分配: 源数据不安全,禁止自动修复
    NegativeAllocations { negative_count: i64 },
    /// 超额分配: 疑似重复占用,禁止静默修补
    OverAllocation {
        original_pieces: f64,
        allocated_pieces: f64,
    },
    /// 状态不一致: 记录状态与按余额推导的状态不符
    StatusMismatch {
        current: LotStatus,
        expected: LotStatus,
    },
    /// 孤立分配: 非 INITIAL 记录缺少来源事务引用,来源无法反推
    OrphanedAllocations { orphan_count: i64 },
}

impl DiscrepancyDetail {
    /// 差异类型
    pub fn kind(&self) -> DiscrepancyKind {
        match self {
            DiscrepancyDetail::BalanceMismatch { .. } => DiscrepancyKind::BalanceMismatch,
            DiscrepancyDetail::NegativeAllocations { .. } => DiscrepancyKind::NegativeAllocations,
            DiscrepancyDetail::OverAllocation { .. } => DiscrepancyKind::OverAllocation,
            DiscrepancyDetail::StatusMismatch { .. } => DiscrepancyKind::StatusMismatch,
            DiscrepancyDetail::OrphanedAllocations { .. } => DiscrepancyKind::OrphanedAllocations,
        }
    }

    /// 生成修正补丁（仅余额/状态两类差异可自动修正）
    pub fn correction(&self) -> Option<CorrectionPatch> {
        match self {
            DiscrepancyDetail::BalanceMismatch {
                recorded_remaining_bf,
                calculated_remaining_bf,
                ..
            } => Some(CorrectionPatch::RemainingBf {
                current: *recorded_remaining_bf,
                correct: *calculated_remaining_bf,
            }),
            DiscrepancyDetail::StatusMismatch { current, expected } => {
                Some(CorrectionPatch::Status {
                    current: *current,
                    correct: *expected,
                })
            }
            _ => None,
        }
    }
}

// ==========================================
// Discrepancy - 单条差异
// ==========================================
// 关系: 单批次单次运行可产生 0..N 条差异
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub lot_id: String,           // 所属批次
    pub lot_no: String,           // 批次号(报告可读性)
    pub severity: Severity,       // 严重等级
    pub message: String,          // 可读描述(可解释性)
    pub detail: DiscrepancyDetail, // 类型化明细
}

impl Discrepancy {
    pub fn kind(&self) -> DiscrepancyKind {
        self.detail.kind()
    }

    /// 仅当差异本身可修正时返回补丁;门控逻辑在修正策略层
    pub fn correction(&self) -> Option<CorrectionPatch> {
        self.detail.correction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_correctable_kinds_carry_patch() {
        let balance = DiscrepancyDetail::BalanceMismatch {
            recorded_remaining_bf: 650.0,
            calculated_remaining_bf: 600.0,
            variance_bf: 50.0,
        };
        let status = DiscrepancyDetail::StatusMismatch {
            current: LotStatus::Active,
            expected: LotStatus::Consumed,
        };
        let negative = DiscrepancyDetail::NegativeAllocations { negative_count: 1 };
        let over = DiscrepancyDetail::OverAllocation {
            original_pieces: 100.0,
            allocated_pieces: 120.0,
        };
        let orphan = DiscrepancyDetail::OrphanedAllocations { orphan_count: 2 };

        assert!(balance.correction().is_some());
        assert!(status.correction().is_some());
        assert!(negative.correction().is_none());
        assert!(over.correction().is_none());
        assert!(orphan.correction().is_none());
    }

    #[test]
    fn test_balance_patch_targets_remaining_bf() {
        let detail = DiscrepancyDetail::BalanceMismatch {
            recorded_remaining_bf: 650.0,
            calculated_remaining_bf: 600.0,
            variance_bf: 50.0,
        };
        let patch = detail.correction().unwrap();
        assert_eq!(patch.field_name(), "remaining_bf");
        assert_eq!(
            patch,
            CorrectionPatch::RemainingBf {
                current: 650.0,
                correct: 600.0
            }
        );
    }
}
