// ==========================================
// 木材理货台账系统 - 对账结果聚合器
// ==========================================
// 职责: 把单批次结果归并为运行级统计,纯 reduce 无副作用
// 约束: fold/merge 满足结合律与交换律,批次处理顺序不影响最终报告
// ==========================================

use crate::domain::discrepancy::Discrepancy;
use crate::domain::report::{CorrectionOutcome, LotReconcileResult};
use crate::domain::types::{DiscrepancyKind, Severity};
use std::collections::BTreeMap;

// ==========================================
// RunAccumulator - 运行级累加器
// ==========================================
// 说明: 差异明细列表受 max_tracked 上限约束(显式配置,不埋魔法数),
// 但 severity/kind 计数始终精确维护,不从被截断的列表反推
#[derive(Debug, Clone)]
pub struct RunAccumulator {
    /// 无差异批次数
    pub clean_lots: i64,
    /// 有差异批次数
    pub lots_with_issues: i64,
    /// 按严重等级计数(精确)
    pub severity_counts: BTreeMap<Severity, i64>,
    /// 按差异类型计数(精确)
    pub kind_counts: BTreeMap<DiscrepancyKind, i64>,
    /// 差异明细(截断到 max_tracked)
    pub discrepancies: Vec<Discrepancy>,
    /// 明细是否被截断
    pub truncated: bool,
    /// 修正结果明细
    pub corrections: Vec<CorrectionOutcome>,
    /// 执行层错误(批次级失败等)
    pub execution_errors: Vec<String>,
    /// 差异明细保留上限
    max_tracked: usize,
}

impl RunAccumulator {
    /// 创建空累加器
    ///
    /// # 参数
    /// - max_tracked: 差异明细保留上限(来自运行上下文)
    pub fn new(max_tracked: usize) -> Self {
        Self {
            clean_lots: 0,
            lots_with_issues: 0,
            severity_counts: BTreeMap::new(),
            kind_counts: BTreeMap::new(),
            discrepancies: Vec::new(),
            truncated: false,
            corrections: Vec::new(),
            execution_errors: Vec::new(),
            max_tracked,
        }
    }

    /// 归并一个批次结果
    ///
    /// # 分桶规则
    /// - error 非空: 不计入 clean/with_issues,进入执行错误列表
    ///   (报告 totalLots 相应减少,错误显式可见)
    /// - 差异非空: with_issues
    /// - 其余: clean
    pub fn fold(&mut self, result: LotReconcileResult) {
        if let Some(err) = result.error {
            self.execution_errors
                .push(format!("批次 {} 处理失败: {}", result.lot_id, err));
            return;
        }

        if result.discrepancies.is_empty() {
            self.clean_lots += 1;
        } else {
            self.lots_with_issues += 1;
            for d in &result.discrepancies {
                *self.severity_counts.entry(d.severity).or_insert(0) += 1;
                *self.kind_counts.entry(d.kind()).or_insert(0) += 1;
            }
            self.push_discrepancies(result.discrepancies);
        }

        self.corrections.extend(result.corrections);
    }

    /// 归并另一个累加器(并行分区的归并点)
    pub fn merge(&mut self, other: RunAccumulator) {
        self.clean_lots += other.clean_lots;
        self.lots_with_issues += other.lots_with_issues;
        for (severity, count) in other.severity_counts {
            *self.severity_counts.entry(severity).or_insert(0) += count;
        }
        for (kind, count) in other.kind_counts {
            *self.kind_counts.entry(kind).or_insert(0) += count;
        }
        self.truncated |= other.truncated;
        self.push_discrepancies(other.discrepancies);
        self.corrections.extend(other.corrections);
        self.execution_errors.extend(other.execution_errors);
    }

    /// 记录执行层错误(枚举失败/任务失败等)
    pub fn record_execution_error(&mut self, message: String) {
        self.execution_errors.push(message);
    }

    /// 批次总数 = clean + with_issues
    pub fn total_lots(&self) -> i64 {
        self.clean_lots + self.lots_with_issues
    }

    /// 差异明细追加,超出上限截断
    fn push_discrepancies(&mut self, mut incoming: Vec<Discrepancy>) {
        let room = self.max_tracked.saturating_sub(self.discrepancies.len());
        if incoming.len() > room {
            incoming.truncate(room);
            self.truncated = true;
        }
        self.discrepancies.extend(incoming);
    }
}
