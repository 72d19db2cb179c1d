// ==========================================
// 木材理货台账系统 - 修正策略
// ==========================================
// 职责: 对单批次的差异列表统一套用修正门控并执行写入
// 红线: 仅"携带补丁且严重等级低于 ERROR"的差异允许自动修正
//   ERROR/CRITICAL 只报告不修复,盲目覆写字段可能掩盖数据损坏
// 红线: 单条修正失败记录在案,不阻断同批次其余修正
// ==========================================

use crate::domain::discrepancy::Discrepancy;
use crate::domain::report::CorrectionOutcome;
use crate::engine::ports::LedgerWriter;

// ==========================================
// CorrectionPolicy - 修正策略
// ==========================================
pub struct CorrectionPolicy {
    // 无状态引擎,门控规则由严重等级与补丁共同决定
}

impl CorrectionPolicy {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 对单批次差异列表应用修正
    ///
    /// # 参数
    /// - lot_id: 批次ID
    /// - discrepancies: 该批次全部差异(检查阶段完成后的完整集合)
    /// - writer: 台账单字段写入接口
    ///
    /// # 返回
    /// - 修正结果列表(仅包含被门控放行的差异)
    ///
    /// # 说明
    /// - 修正顺序执行,门控决策基于完整差异集合而非部分结果
    /// - 幂等: 已修正批次重跑会推算出相同期望值,不再产出差异
    pub fn apply(
        &self,
        lot_id: &str,
        discrepancies: &[Discrepancy],
        writer: &dyn LedgerWriter,
    ) -> Vec<CorrectionOutcome> {
        let mut outcomes = Vec::new();

        for discrepancy in discrepancies {
            // 门控 1: 差异必须携带修正补丁
            let patch = match discrepancy.correction() {
                Some(p) => p,
                None => continue,
            };

            // 门控 2: 严重等级必须严格低于 ERROR
            if !discrepancy.severity.allows_auto_correct() {
                tracing::debug!(
                    lot_id = %lot_id,
                    kind = %discrepancy.kind(),
                    severity = %discrepancy.severity,
                    "严重等级超出自动修正门控,仅报告"
                );
                continue;
            }

            let outcome = match writer.apply_correction(lot_id, &patch) {
                Ok(()) => {
                    tracing::info!(
                        lot_id = %lot_id,
                        field = patch.field_name(),
                        old_value = %patch.current_display(),
                        new_value = %patch.correct_display(),
                        "自动修正已应用"
                    );
                    CorrectionOutcome {
                        lot_id: lot_id.to_string(),
                        kind: discrepancy.kind(),
                        field: patch.field_name().to_string(),
                        old_value: patch.current_display(),
                        new_value: patch.correct_display(),
                        success: true,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        lot_id = %lot_id,
                        field = patch.field_name(),
                        error = %e,
                        "自动修正写入失败"
                    );
                    CorrectionOutcome {
                        lot_id: lot_id.to_string(),
                        kind: discrepancy.kind(),
                        field: patch.field_name().to_string(),
                        old_value: patch.current_display(),
                        new_value: patch.correct_display(),
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}

impl Default for CorrectionPolicy {
    fn default() -> Self {
        Self::new()
    }
}
