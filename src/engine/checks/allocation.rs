// ==========================================
// 木材理货台账系统 - 分配完整性检查
// ==========================================
// 职责: 负数分配记录 + 件数超额分配
// 红线: 两类问题都禁止自动修正
//   - 负数源数据不安全,必须人工处理
//   - 超额分配疑似重复占用,静默修补会掩盖事故
// ==========================================

use crate::domain::discrepancy::{Discrepancy, DiscrepancyDetail};
use crate::domain::lot::Lot;
use crate::domain::report::CheckOutcome;
use crate::domain::types::{CheckKind, Severity};
use crate::engine::checks::CheckEvaluation;
use crate::engine::ports::LedgerReader;
use serde_json::json;

/// 分配完整性检查
///
/// # 规则
/// (a) 存在 board_feet < 0 的有效分配记录 -> NEGATIVE_ALLOCATIONS, ERROR
/// (b) ALLOCATED/CONSUMED 件数合计 > original_pieces -> OVER_ALLOCATION, CRITICAL
///
/// 两类差异可同时产出
pub fn check_allocation_integrity(lot: &Lot, ledger: &dyn LedgerReader) -> CheckEvaluation {
    let negative_count = match ledger.count_negative_allocations(&lot.lot_id) {
        Ok(v) => v,
        Err(e) => {
            return CheckEvaluation::clean(CheckOutcome::errored(
                CheckKind::AllocationIntegrity,
                format!("负数分配统计查询失败: {}", e),
            ));
        }
    };

    let allocated_pieces = match ledger.sum_allocated_pieces(&lot.lot_id) {
        Ok(v) => v,
        Err(e) => {
            return CheckEvaluation::clean(CheckOutcome::errored(
                CheckKind::AllocationIntegrity,
                format!("分配件数汇总查询失败: {}", e),
            ));
        }
    };

    let details = json!({
        "negative_count": negative_count,
        "allocated_pieces": allocated_pieces,
        "original_pieces": lot.original_pieces,
    });

    let mut discrepancies = Vec::new();

    if negative_count > 0 {
        discrepancies.push(Discrepancy {
            lot_id: lot.lot_id.clone(),
            lot_no: lot.lot_no.clone(),
            severity: Severity::Error,
            message: format!(
                "批次 {} 存在 {} 条负数板英尺分配记录,需人工修复",
                lot.lot_no, negative_count
            ),
            detail: DiscrepancyDetail::NegativeAllocations {
                negative_count,
            },
        });
    }

    if allocated_pieces > lot.original_pieces {
        discrepancies.push(Discrepancy {
            lot_id: lot.lot_id.clone(),
            lot_no: lot.lot_no.clone(),
            severity: Severity::Critical,
            message: format!(
                "批次 {} 超额分配: 已分配件数 {:.1} 超过原始件数 {:.1},疑似重复占用",
                lot.lot_no, allocated_pieces, lot.original_pieces
            ),
            detail: DiscrepancyDetail::OverAllocation {
                original_pieces: lot.original_pieces,
                allocated_pieces,
            },
        });
    }

    if discrepancies.is_empty() {
        CheckEvaluation::clean(CheckOutcome::passed(CheckKind::AllocationIntegrity, details))
    } else {
        CheckEvaluation::flagged(
            CheckOutcome::failed(CheckKind::AllocationIntegrity, details),
            discrepancies,
        )
    }
}
