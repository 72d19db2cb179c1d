// ==========================================
// 木材理货台账系统 - 对账运行编排器
// ==========================================
// 职责: 枚举批次 -> 并行分发单批次处理 -> 汇聚 -> 报告与告警
// 红线: 单批次失败绝不中断整体运行,报告总会产出
// 说明: 检查与单批次处理是同步阻塞代码(rusqlite),
//   通过 spawn_blocking 分发到阻塞线程池,归并点在 async 侧
// ==========================================

use crate::domain::lot::Lot;
use crate::domain::report::ReconciliationReport;
use crate::engine::aggregate::RunAccumulator;
use crate::engine::context::RunContext;
use crate::engine::ports::{LedgerReader, LedgerWriter, ReportStore};
use crate::engine::processor::LotProcessor;
use crate::engine::report::ReportBuilder;
use crate::notify::AlertSink;
use crate::repository::LotRepository;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

// ==========================================
// ReconcileOrchestrator - 对账运行编排器
// ==========================================
pub struct ReconcileOrchestrator {
    lot_repo: Arc<LotRepository>,
    ledger: Arc<dyn LedgerReader>,
    writer: Arc<dyn LedgerWriter>,
    report_store: Arc<dyn ReportStore>,
    alert_sink: Arc<dyn AlertSink>,
}

impl ReconcileOrchestrator {
    /// 构造函数
    pub fn new(
        lot_repo: Arc<LotRepository>,
        ledger: Arc<dyn LedgerReader>,
        writer: Arc<dyn LedgerWriter>,
        report_store: Arc<dyn ReportStore>,
        alert_sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            lot_repo,
            ledger,
            writer,
            report_store,
            alert_sink,
        }
    }

    /// 执行一次完整对账运行
    ///
    /// # 流程
    /// 1. 惰性分页枚举参与对账的批次(排除 VOID/CLOSED)
    /// 2. 按并行度分发单批次处理,各批次互相独立
    /// 3. 全部批次完成后统一归并(归并满足交换律,完成顺序无关)
    /// 4. 构建报告 -> 持久化 -> 按需告警
    ///
    /// # 返回
    /// - 对账报告(持久化失败时报告仍返回,错误记入执行错误列表)
    pub async fn run(&self, ctx: RunContext) -> ReconciliationReport {
        let run_at = Utc::now();
        tracing::info!(
            auto_correct = ctx.auto_correct_enabled,
            page_size = ctx.page_size,
            concurrency = ctx.concurrency,
            "对账运行开始"
        );

        let mut acc = RunAccumulator::new(ctx.max_tracked_discrepancies);

        // 1. 枚举批次(游标失败保留已取前缀,错误记录在案)
        let (lots, enumerate_errors) = self.enumerate_lots(ctx.page_size).await;
        for err in enumerate_errors {
            acc.record_execution_error(err);
        }

        // 2. 分发 + 3. 归并
        let mut results = stream::iter(lots.into_iter())
            .map(|lot| {
                let ledger = Arc::clone(&self.ledger);
                let writer = Arc::clone(&self.writer);
                let ctx = ctx.clone();
                tokio::task::spawn_blocking(move || {
                    let processor = LotProcessor::new();
                    processor.process(&lot, ledger.as_ref(), writer.as_ref(), &ctx)
                })
            })
            .buffer_unordered(ctx.concurrency.max(1));

        while let Some(joined) = results.next().await {
            match joined {
                Ok(result) => acc.fold(result),
                Err(e) => {
                    tracing::error!(error = %e, "批次处理任务异常终止");
                    acc.record_execution_error(format!("批次处理任务异常终止: {}", e));
                }
            }
        }

        // 4. 报告与告警
        let builder = ReportBuilder::new();
        let report = builder.build(acc, run_at);
        let report = builder.persist_and_alert(
            report,
            self.report_store.as_ref(),
            self.alert_sink.as_ref(),
            &ctx,
        );

        tracing::info!(
            report_id = %report.report_id,
            total_lots = report.total_lots,
            clean_lots = report.clean_lots,
            lots_with_issues = report.lots_with_issues,
            corrections_applied = report.corrections_applied,
            execution_errors = report.execution_errors.len(),
            "对账运行结束"
        );
        report
    }

    /// 在阻塞线程池中枚举批次
    ///
    /// # 返回
    /// - (已取到的批次, 枚举期间的错误)
    /// - 游标中途失败: 保留失败前的批次,错误上抛为执行错误
    async fn enumerate_lots(&self, page_size: usize) -> (Vec<Lot>, Vec<String>) {
        let lot_repo = Arc::clone(&self.lot_repo);
        let joined = tokio::task::spawn_blocking(move || {
            let mut lots = Vec::new();
            let mut errors = Vec::new();
            for item in lot_repo.iter_active_lots(page_size) {
                match item {
                    Ok(lot) => lots.push(lot),
                    Err(e) => {
                        errors.push(format!("批次枚举失败: {}", e));
                        break;
                    }
                }
            }
            (lots, errors)
        })
        .await;

        match joined {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "批次枚举任务异常终止");
                (Vec::new(), vec![format!("批次枚举任务异常终止: {}", e)])
            }
        }
    }
}
