// ==========================================
// 木材理货台账系统 - 单批次处理器
// ==========================================
// 职责: 单批次编排,四项检查 -> 收集差异 -> 条件修正
// 红线: 单批次任何未捕获错误只进入该批次结果,绝不中断整批
// ==========================================

use crate::domain::lot::Lot;
use crate::domain::report::LotReconcileResult;
use crate::engine::checks::{
    check_allocation_integrity, check_balance, check_orphans, check_status,
};
use crate::engine::context::RunContext;
use crate::engine::correction::CorrectionPolicy;
use crate::engine::ports::{LedgerReader, LedgerWriter};
use std::panic::{catch_unwind, AssertUnwindSafe};

// ==========================================
// LotProcessor - 单批次处理器
// ==========================================
pub struct LotProcessor {
    policy: CorrectionPolicy,
}

impl LotProcessor {
    /// 构造函数
    pub fn new() -> Self {
        Self {
            policy: CorrectionPolicy::new(),
        }
    }

    /// 处理单个批次
    ///
    /// # 流程
    /// 1. 依次执行四项检查(检查只读且互相独立,顺序无关)
    /// 2. 收集全部差异
    /// 3. 若启用自动修正,基于完整差异集合顺序应用修正
    ///
    /// # 失败隔离
    /// - 处理过程 panic 被捕获进结果的 error 字段,不向外传播
    pub fn process(
        &self,
        lot: &Lot,
        ledger: &dyn LedgerReader,
        writer: &dyn LedgerWriter,
        ctx: &RunContext,
    ) -> LotReconcileResult {
        let lot_id = lot.lot_id.clone();
        let lot_no = lot.lot_no.clone();

        let result = catch_unwind(AssertUnwindSafe(|| self.process_inner(lot, ledger, writer, ctx)));

        match result {
            Ok(r) => r,
            Err(panic) => {
                let message = panic_message(panic);
                tracing::error!(lot_id = %lot_id, error = %message, "批次处理发生未捕获错误");
                LotReconcileResult {
                    lot_id,
                    lot_no,
                    checks: Vec::new(),
                    discrepancies: Vec::new(),
                    corrections: Vec::new(),
                    error: Some(message),
                }
            }
        }
    }

    fn process_inner(
        &self,
        lot: &Lot,
        ledger: &dyn LedgerReader,
        writer: &dyn LedgerWriter,
        ctx: &RunContext,
    ) -> LotReconcileResult {
        // 1. 四项检查
        let evaluations = vec![
            check_balance(lot, ledger),
            check_allocation_integrity(lot, ledger),
            check_status(lot),
            check_orphans(lot, ledger),
        ];

        let mut checks = Vec::with_capacity(evaluations.len());
        let mut discrepancies = Vec::new();
        for eval in evaluations {
            checks.push(eval.outcome);
            discrepancies.extend(eval.discrepancies);
        }

        // 2. 条件修正(检查全部完成后,门控基于完整差异集合)
        let corrections = if ctx.auto_correct_enabled && !discrepancies.is_empty() {
            self.policy.apply(&lot.lot_id, &discrepancies, writer)
        } else {
            Vec::new()
        };

        if !discrepancies.is_empty() {
            tracing::debug!(
                lot_id = %lot.lot_id,
                discrepancy_count = discrepancies.len(),
                correction_count = corrections.len(),
                "批次对账发现差异"
            );
        }

        LotReconcileResult {
            lot_id: lot.lot_id.clone(),
            lot_no: lot.lot_no.clone(),
            checks,
            discrepancies,
            corrections,
            error: None,
        }
    }
}

impl Default for LotProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// 从 panic 载荷提取可读信息
fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "未知批次处理错误".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discrepancy::CorrectionPatch;
    use crate::domain::types::LotStatus;
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use chrono::Utc;

    struct StubLedger {
        consumed_bf: f64,
        panic_on_read: bool,
    }

    impl LedgerReader for StubLedger {
        fn sum_consumed_board_feet(&self, _lot_id: &str) -> RepositoryResult<f64> {
            if self.panic_on_read {
                panic!("模拟底层故障");
            }
            Ok(self.consumed_bf)
        }

        fn count_negative_allocations(&self, _lot_id: &str) -> RepositoryResult<i64> {
            Ok(0)
        }

        fn sum_allocated_pieces(&self, _lot_id: &str) -> RepositoryResult<f64> {
            Ok(0.0)
        }

        fn count_orphaned_allocations(&self, _lot_id: &str) -> RepositoryResult<i64> {
            Ok(0)
        }
    }

    struct NoopWriter;

    impl LedgerWriter for NoopWriter {
        fn apply_correction(
            &self,
            _lot_id: &str,
            _patch: &CorrectionPatch,
        ) -> RepositoryResult<()> {
            Err(RepositoryError::InternalError("不应被调用".to_string()))
        }
    }

    fn make_lot(original_bf: f64, remaining_bf: f64, status: LotStatus) -> Lot {
        Lot {
            lot_id: "LOT-1".to_string(),
            lot_no: "TS-0001".to_string(),
            item_id: "ITEM-1".to_string(),
            location_id: None,
            original_bf,
            remaining_bf,
            original_pieces: 100.0,
            remaining_pieces: 60.0,
            bf_per_piece: 10.0,
            status,
            tally_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_clean_lot_runs_all_four_checks() {
        let processor = LotProcessor::new();
        let ledger = StubLedger {
            consumed_bf: 400.0,
            panic_on_read: false,
        };
        let lot = make_lot(1000.0, 600.0, LotStatus::Partial);
        let result = processor.process(&lot, &ledger, &NoopWriter, &RunContext::defaults());

        assert_eq!(result.checks.len(), 4);
        assert!(result.is_clean());
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn test_auto_correct_disabled_reports_only() {
        let processor = LotProcessor::new();
        let ledger = StubLedger {
            consumed_bf: 400.0,
            panic_on_read: false,
        };
        // 余额漂移 50 BF -> WARNING 差异,但未启用自动修正
        let lot = make_lot(1000.0, 650.0, LotStatus::Partial);
        let result = processor.process(&lot, &ledger, &NoopWriter, &RunContext::defaults());

        assert_eq!(result.discrepancies.len(), 1);
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn test_panic_captured_into_lot_error() {
        let processor = LotProcessor::new();
        let ledger = StubLedger {
            consumed_bf: 0.0,
            panic_on_read: true,
        };
        let lot = make_lot(1000.0, 600.0, LotStatus::Partial);
        let result = processor.process(&lot, &ledger, &NoopWriter, &RunContext::defaults());

        assert!(result.error.is_some());
        assert!(result.discrepancies.is_empty());
        assert!(result.corrections.is_empty());
    }
}
