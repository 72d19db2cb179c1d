// ==========================================
// 木材理货台账系统 - 状态校验检查
// ==========================================
// 职责: 记录状态 vs 按余额推导的期望状态
// 说明: 纯函数检查,不访问台账存储
// ==========================================

use crate::domain::discrepancy::{Discrepancy, DiscrepancyDetail};
use crate::domain::lot::Lot;
use crate::domain::report::CheckOutcome;
use crate::domain::types::{CheckKind, Severity};
use crate::engine::checks::CheckEvaluation;
use serde_json::json;

/// 状态校验
///
/// # 推导表(见 Lot::expected_status)
/// - remaining_bf <= 0                       -> CONSUMED
/// - 0 < remaining < original 且当前 ACTIVE  -> PARTIAL
/// - remaining == original 且当前 PARTIAL    -> ACTIVE
/// - 其余情况保持不变
///
/// # 修正
/// - 补丁: status := expected (WARNING,允许自动修正)
pub fn check_status(lot: &Lot) -> CheckEvaluation {
    let expected = lot.expected_status();

    let details = json!({
        "current_status": lot.status,
        "expected_status": expected,
        "remaining_bf": lot.remaining_bf,
        "original_bf": lot.original_bf,
    });

    if expected == lot.status {
        return CheckEvaluation::clean(CheckOutcome::passed(CheckKind::Status, details));
    }

    let discrepancy = Discrepancy {
        lot_id: lot.lot_id.clone(),
        lot_no: lot.lot_no.clone(),
        severity: Severity::Warning,
        message: format!(
            "批次 {} 状态不一致: 记录状态 {}, 按余额推导应为 {}",
            lot.lot_no, lot.status, expected
        ),
        detail: DiscrepancyDetail::StatusMismatch {
            current: lot.status,
            expected,
        },
    };

    CheckEvaluation::flagged(
        CheckOutcome::failed(CheckKind::Status, details),
        vec![discrepancy],
    )
}
