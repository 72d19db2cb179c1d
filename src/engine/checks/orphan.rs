// ==========================================
// 木材理货台账系统 - 孤立记录检测
// ==========================================
// 职责: 非 INITIAL 分配记录缺少来源事务引用
// 红线: 来源事务无法反推,禁止自动修正
// ==========================================

use crate::domain::discrepancy::{Discrepancy, DiscrepancyDetail};
use crate::domain::lot::Lot;
use crate::domain::report::CheckOutcome;
use crate::domain::types::{CheckKind, Severity};
use crate::engine::checks::CheckEvaluation;
use crate::engine::ports::LedgerReader;
use serde_json::json;

/// 孤立记录检测
///
/// # 规则
/// - orphan_count = 非 INITIAL 类型且来源事务引用为空的记录数
/// - orphan_count > 0 -> ORPHANED_ALLOCATIONS, WARNING, 无修正
pub fn check_orphans(lot: &Lot, ledger: &dyn LedgerReader) -> CheckEvaluation {
    let orphan_count = match ledger.count_orphaned_allocations(&lot.lot_id) {
        Ok(v) => v,
        Err(e) => {
            return CheckEvaluation::clean(CheckOutcome::errored(
                CheckKind::Orphans,
                format!("孤立记录统计查询失败: {}", e),
            ));
        }
    };

    let details = json!({ "orphan_count": orphan_count });

    if orphan_count == 0 {
        return CheckEvaluation::clean(CheckOutcome::passed(CheckKind::Orphans, details));
    }

    let discrepancy = Discrepancy {
        lot_id: lot.lot_id.clone(),
        lot_no: lot.lot_no.clone(),
        severity: Severity::Warning,
        message: format!(
            "批次 {} 存在 {} 条孤立分配记录(缺少来源事务引用)",
            lot.lot_no, orphan_count
        ),
        detail: DiscrepancyDetail::OrphanedAllocations { orphan_count },
    };

    CheckEvaluation::flagged(
        CheckOutcome::failed(CheckKind::Orphans, details),
        vec![discrepancy],
    )
}
