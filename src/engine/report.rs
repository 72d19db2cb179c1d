// ==========================================
// 木材理货台账系统 - 报告生成器
// ==========================================
// 职责: 汇总计数 -> 持久化报告 -> 条件触发告警
// 红线: 告警只携带汇总统计,逐批次明细仅保留在持久化报告中
// ==========================================

use crate::domain::report::ReconciliationReport;
use crate::domain::types::{DiscrepancyKind, Severity};
use crate::engine::aggregate::RunAccumulator;
use crate::engine::context::RunContext;
use crate::engine::ports::ReportStore;
use crate::notify::{AlertMessage, AlertSink};
use chrono::{DateTime, Utc};
use uuid::Uuid;

// ==========================================
// ReportBuilder - 报告生成器
// ==========================================
pub struct ReportBuilder {
    // 无状态引擎
}

impl ReportBuilder {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 从累加器构建对账报告
    ///
    /// # 计数口径
    /// - total_lots = clean + with_issues(批次级失败不计入,见执行错误列表)
    /// - corrections_applied/failed 按 success 划分
    pub fn build(&self, acc: RunAccumulator, run_at: DateTime<Utc>) -> ReconciliationReport {
        let corrections_applied = acc.corrections.iter().filter(|c| c.success).count() as i64;
        let corrections_failed = acc.corrections.len() as i64 - corrections_applied;

        let mut execution_errors = acc.execution_errors;
        if acc.truncated {
            execution_errors.push("差异明细超出保留上限,列表已截断(计数不受影响)".to_string());
        }

        ReconciliationReport {
            report_id: Uuid::new_v4().to_string(),
            run_at,
            total_lots: acc.clean_lots + acc.lots_with_issues,
            clean_lots: acc.clean_lots,
            lots_with_issues: acc.lots_with_issues,
            severity_counts: acc.severity_counts,
            kind_counts: acc.kind_counts,
            corrections_applied,
            corrections_failed,
            discrepancies: acc.discrepancies,
            corrections: acc.corrections,
            execution_errors,
        }
    }

    /// 持久化报告并按需触发告警
    ///
    /// # 失败语义
    /// - 持久化失败: 记入报告的执行错误并落日志,不中断(报告仍返回给调用方)
    /// - 告警投递尽力而为,由 AlertSink 实现保证不抛错
    pub fn persist_and_alert(
        &self,
        mut report: ReconciliationReport,
        store: &dyn ReportStore,
        sink: &dyn AlertSink,
        ctx: &RunContext,
    ) -> ReconciliationReport {
        match store.insert_report(&report) {
            Ok(report_id) => {
                tracing::info!(report_id = %report_id, "对账报告已持久化");
            }
            Err(e) => {
                tracing::error!(error = %e, "对账报告持久化失败");
                report
                    .execution_errors
                    .push(format!("报告持久化失败: {}", e));
            }
        }

        // 告警条件: 存在 ERROR 或 CRITICAL 差异
        if report.needs_alert() {
            match &ctx.admin_recipient {
                Some(recipient) => {
                    let message = AlertMessage {
                        recipient: recipient.clone(),
                        subject: format!(
                            "[台账对账] 发现高严重度差异: ERROR={} CRITICAL={}",
                            report.severity_count(Severity::Error),
                            report.severity_count(Severity::Critical)
                        ),
                        body: compose_alert_body(&report),
                    };
                    sink.send_alert(&message);
                }
                None => {
                    tracing::warn!(
                        error_count = report.severity_count(Severity::Error),
                        critical_count = report.severity_count(Severity::Critical),
                        "存在高严重度差异但未配置告警接收人,告警未投递"
                    );
                }
            }
        }

        report
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 组装告警正文(仅汇总统计)
fn compose_alert_body(report: &ReconciliationReport) -> String {
    let mut lines = Vec::new();
    lines.push(format!("对账运行时间: {}", report.run_at.to_rfc3339()));
    lines.push(format!(
        "检查批次: {} (正常 {} / 有差异 {})",
        report.total_lots, report.clean_lots, report.lots_with_issues
    ));

    lines.push("按严重等级:".to_string());
    for severity in [
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Info,
    ] {
        let count = report.severity_count(severity);
        if count > 0 {
            lines.push(format!("  - {}: {}", severity, count));
        }
    }

    lines.push("按差异类型:".to_string());
    for kind in DiscrepancyKind::all() {
        let count = report.kind_count(kind);
        if count > 0 {
            lines.push(format!("  - {}: {}", kind, count));
        }
    }

    lines.push(format!(
        "自动修正: 成功 {} / 失败 {}",
        report.corrections_applied, report.corrections_failed
    ));
    lines.push("明细见持久化对账报告。".to_string());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discrepancy::{Discrepancy, DiscrepancyDetail};
    use crate::notify::AlertMessage;
    use crate::repository::error::RepositoryResult;
    use std::sync::Mutex;

    struct StubStore {
        inserted: Mutex<usize>,
    }

    impl ReportStore for StubStore {
        fn insert_report(&self, report: &ReconciliationReport) -> RepositoryResult<String> {
            *self.inserted.lock().unwrap() += 1;
            Ok(report.report_id.clone())
        }
    }

    struct CollectingSink {
        sent: Mutex<Vec<AlertMessage>>,
    }

    impl AlertSink for CollectingSink {
        fn send_alert(&self, message: &AlertMessage) {
            self.sent.lock().unwrap().push(message.clone());
        }
    }

    fn acc_with(severity: Severity) -> RunAccumulator {
        let mut acc = RunAccumulator::new(100);
        acc.fold(crate::domain::report::LotReconcileResult {
            lot_id: "LOT-1".to_string(),
            lot_no: "TS-0001".to_string(),
            checks: Vec::new(),
            discrepancies: vec![Discrepancy {
                lot_id: "LOT-1".to_string(),
                lot_no: "TS-0001".to_string(),
                severity,
                message: "测试差异".to_string(),
                detail: DiscrepancyDetail::OrphanedAllocations { orphan_count: 1 },
            }],
            corrections: Vec::new(),
            error: None,
        });
        acc
    }

    fn ctx_with_recipient() -> RunContext {
        let mut ctx = RunContext::defaults();
        ctx.admin_recipient = Some("admin@example.com".to_string());
        ctx
    }

    #[test]
    fn test_error_severity_triggers_exactly_one_alert() {
        let builder = ReportBuilder::new();
        let report = builder.build(acc_with(Severity::Error), Utc::now());
        let store = StubStore {
            inserted: Mutex::new(0),
        };
        let sink = CollectingSink {
            sent: Mutex::new(Vec::new()),
        };

        builder.persist_and_alert(report, &store, &sink, &ctx_with_recipient());

        assert_eq!(*store.inserted.lock().unwrap(), 1);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_warning_only_run_triggers_no_alert() {
        let builder = ReportBuilder::new();
        let report = builder.build(acc_with(Severity::Warning), Utc::now());
        let store = StubStore {
            inserted: Mutex::new(0),
        };
        let sink = CollectingSink {
            sent: Mutex::new(Vec::new()),
        };

        builder.persist_and_alert(report, &store, &sink, &ctx_with_recipient());

        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_alert_body_contains_counts_not_lot_details() {
        let builder = ReportBuilder::new();
        let report = builder.build(acc_with(Severity::Critical), Utc::now());
        let body = compose_alert_body(&report);

        assert!(body.contains("CRITICAL"));
        assert!(body.contains("自动修正"));
        // 正文不携带批次号明细
        assert!(!body.contains("TS-0001"));
    }
}
