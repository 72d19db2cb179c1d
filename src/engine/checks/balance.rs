// ==========================================
// 木材理货台账系统 - 余额核对检查
// ==========================================
// 职责: 记录余额 vs 按分配记录推算余额
// 规则: 偏差超容差即差异;偏差超原始量 5% 升级为 ERROR
// ==========================================

use crate::domain::discrepancy::{Discrepancy, DiscrepancyDetail};
use crate::domain::lot::Lot;
use crate::domain::report::CheckOutcome;
use crate::domain::types::{CheckKind, Severity};
use crate::engine::checks::CheckEvaluation;
use crate::engine::ports::LedgerReader;
use serde_json::json;

/// 余额核对容差(板英尺)
///
/// 说明: 吸收浮点噪声,低于容差的偏差不视为差异
pub const BALANCE_TOLERANCE_BF: f64 = 0.01;

/// 升级为 ERROR 的偏差占比阈值(相对原始板英尺)
pub const BALANCE_ERROR_VARIANCE_RATIO: f64 = 0.05;

/// 余额核对
///
/// # 规则
/// 1. consumed_bf = Σ(CONSUMED 分配记录的 board_feet)
/// 2. calculated_remaining = original_bf - consumed_bf
/// 3. variance = remaining_bf - calculated_remaining
/// 4. |variance| > 0.01 BF 即产出 BALANCE_MISMATCH
/// 5. |variance| > 5% * original_bf 时严重等级为 ERROR,否则 WARNING
///
/// # 修正
/// - 补丁: remaining_bf := calculated_remaining (仅 WARNING 可自动修正)
pub fn check_balance(lot: &Lot, ledger: &dyn LedgerReader) -> CheckEvaluation {
    let consumed_bf = match ledger.sum_consumed_board_feet(&lot.lot_id) {
        Ok(v) => v,
        Err(e) => {
            // 单项检查失败不阻断其余检查
            return CheckEvaluation::clean(CheckOutcome::errored(
                CheckKind::Balance,
                format!("消耗量汇总查询失败: {}", e),
            ));
        }
    };

    let calculated_remaining = lot.original_bf - consumed_bf;
    let variance = lot.remaining_bf - calculated_remaining;

    let details = json!({
        "recorded_remaining_bf": lot.remaining_bf,
        "consumed_bf": consumed_bf,
        "calculated_remaining_bf": calculated_remaining,
        "variance_bf": variance,
    });

    if variance.abs() <= BALANCE_TOLERANCE_BF {
        return CheckEvaluation::clean(CheckOutcome::passed(CheckKind::Balance, details));
    }

    let severity = if variance.abs() > BALANCE_ERROR_VARIANCE_RATIO * lot.original_bf {
        Severity::Error
    } else {
        Severity::Warning
    };

    let discrepancy = Discrepancy {
        lot_id: lot.lot_id.clone(),
        lot_no: lot.lot_no.clone(),
        severity,
        message: format!(
            "批次 {} 余额不一致: 记录余额 {:.2} BF, 推算余额 {:.2} BF, 偏差 {:.2} BF",
            lot.lot_no, lot.remaining_bf, calculated_remaining, variance
        ),
        detail: DiscrepancyDetail::BalanceMismatch {
            recorded_remaining_bf: lot.remaining_bf,
            // 修正值钳制到合法区间,余额永不为负
            calculated_remaining_bf: lot.clamp_remaining_bf(calculated_remaining),
            variance_bf: variance,
        },
    };

    CheckEvaluation::flagged(
        CheckOutcome::failed(CheckKind::Balance, details),
        vec![discrepancy],
    )
}
