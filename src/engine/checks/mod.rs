// ==========================================
// 木材理货台账系统 - 一致性检查引擎
// ==========================================
// 职责: 四项独立只读检查,输出裁决与差异描述
// 红线: 检查只产出裁决,绝不直接改写数据
// 说明: 四项检查互相独立,单批次可累积多条差异
// ==========================================

pub mod allocation;
pub mod balance;
pub mod orphan;
pub mod status;


use crate::domain::discrepancy::Discrepancy;
use crate::domain::report::CheckOutcome;

pub use allocation::check_allocation_integrity;
pub use balance::check_balance;
pub use balance::{BALANCE_ERROR_VARIANCE_RATIO, BALANCE_TOLERANCE_BF};
pub use orphan::check_orphans;
pub use status::check_status;

// ==========================================
// CheckEvaluation - 单项检查评估结果
// ==========================================
// 说明: 分配完整性检查可同时产出负数分配与超额分配两条差异,
// 因此差异为列表
#[derive(Debug, Clone)]
pub struct CheckEvaluation {
    pub outcome: CheckOutcome,
    pub discrepancies: Vec<Discrepancy>,
}

impl CheckEvaluation {
    /// 通过,无差异
    pub fn clean(outcome: CheckOutcome) -> Self {
        Self {
            outcome,
            discrepancies: Vec::new(),
        }
    }

    /// 未通过,携带差异
    pub fn flagged(outcome: CheckOutcome, discrepancies: Vec<Discrepancy>) -> Self {
        Self {
            outcome,
            discrepancies,
        }
    }
}
