// ==========================================
// 木材理货台账系统 - 对账报告仓储
// ==========================================
// 红线: 报告追加写,持久化后不提供更新接口(审计链)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::discrepancy::Discrepancy;
use crate::domain::report::{CorrectionOutcome, ReconciliationReport};
use crate::domain::types::{DiscrepancyKind, Severity};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ReconReportRepository - 对账报告仓储
// ==========================================
/// 对账报告仓储
/// 职责: 管理 recon_report 表的追加写与审计读取
pub struct ReconReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReconReportRepository {
    /// 创建新的 ReconReportRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 持久化对账报告
    ///
    /// # 返回
    /// - Ok(report_id): 报告ID
    ///
    /// # 说明
    /// - 差异/修正明细与执行错误序列化为 JSON 列
    /// - 计数列冗余存储,便于不反序列化明细直接做审计查询
    pub fn insert_report(&self, report: &ReconciliationReport) -> RepositoryResult<String> {
        let severity_counts = serde_json::to_string(&report.severity_counts)?;
        let kind_counts = serde_json::to_string(&report.kind_counts)?;
        let discrepancies = serde_json::to_string(&DiscrepancyPayload {
            discrepancies: report.discrepancies.clone(),
            corrections: report.corrections.clone(),
        })?;
        let execution_errors = serde_json::to_string(&report.execution_errors)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO recon_report (
                report_id, run_at,
                total_lots, clean_lots, lots_with_issues,
                corrections_applied, corrections_failed,
                severity_counts, kind_counts, discrepancies, execution_errors
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                report.report_id,
                report.run_at,
                report.total_lots,
                report.clean_lots,
                report.lots_with_issues,
                report.corrections_applied,
                report.corrections_failed,
                severity_counts,
                kind_counts,
                discrepancies,
                execution_errors,
            ],
        )?;

        Ok(report.report_id.clone())
    }

    /// 按ID读取对账报告(审计用)
    pub fn get_report(&self, report_id: &str) -> RepositoryResult<ReconciliationReport> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                "SELECT * FROM recon_report WHERE report_id = ?1",
                params![report_id],
                |row| {
                    Ok(ReportRow {
                        report_id: row.get("report_id")?,
                        run_at: row.get("run_at")?,
                        total_lots: row.get("total_lots")?,
                        clean_lots: row.get("clean_lots")?,
                        lots_with_issues: row.get("lots_with_issues")?,
                        corrections_applied: row.get("corrections_applied")?,
                        corrections_failed: row.get("corrections_failed")?,
                        severity_counts: row.get("severity_counts")?,
                        kind_counts: row.get("kind_counts")?,
                        discrepancies: row.get("discrepancies")?,
                        execution_errors: row.get("execution_errors")?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                    entity: "recon_report".to_string(),
                    id: report_id.to_string(),
                },
                other => other.into(),
            })?;

        let severity_counts: BTreeMap<Severity, i64> =
            serde_json::from_str(&row.severity_counts)?;
        let kind_counts: BTreeMap<DiscrepancyKind, i64> = serde_json::from_str(&row.kind_counts)?;
        let payload: DiscrepancyPayload = serde_json::from_str(&row.discrepancies)?;
        let execution_errors: Vec<String> = serde_json::from_str(&row.execution_errors)?;

        Ok(ReconciliationReport {
            report_id: row.report_id,
            run_at: row.run_at,
            total_lots: row.total_lots,
            clean_lots: row.clean_lots,
            lots_with_issues: row.lots_with_issues,
            severity_counts,
            kind_counts,
            corrections_applied: row.corrections_applied,
            corrections_failed: row.corrections_failed,
            discrepancies: payload.discrepancies,
            corrections: payload.corrections,
            execution_errors,
        })
    }

    /// 报告总数(审计用)
    pub fn count_reports(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM recon_report", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// 明细 JSON 列的载荷(差异 + 修正合并存储)
#[derive(serde::Serialize, serde::Deserialize)]
struct DiscrepancyPayload {
    discrepancies: Vec<Discrepancy>,
    corrections: Vec<CorrectionOutcome>,
}

/// 中间行结构(列读取与反序列化分离)
struct ReportRow {
    report_id: String,
    run_at: chrono::DateTime<chrono::Utc>,
    total_lots: i64,
    clean_lots: i64,
    lots_with_issues: i64,
    corrections_applied: i64,
    corrections_failed: i64,
    severity_counts: String,
    kind_counts: String,
    discrepancies: String,
    execution_errors: String,
}
