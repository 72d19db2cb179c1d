// ==========================================
// 木材理货台账系统 - 分配记录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 分配记录对对账子系统只读,本仓储仅提供聚合查询与测试写入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::allocation::AllocationRecord;
use crate::domain::types::{AllocationStatus, TRANSACTION_TYPE_INITIAL};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// AllocationRepository - 分配记录仓储
// ==========================================
/// 分配记录仓储
/// 职责: 管理 lot_allocation 表的数据访问
pub struct AllocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationRepository {
    /// 创建新的 AllocationRepository 实例
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

    /// 行映射: lot_allocation -> AllocationRecord
    fn map_row(row: &Row) -> rusqlite::Result<AllocationRecord> {
        let status_str: String = row.get("status")?;
        Ok(AllocationRecord {
            allocation_id: row.get("allocation_id")?,
            lot_id: row.get("lot_id")?,
            board_feet: row.get("board_feet")?,
            quantity: row.get("quantity")?,
            status: AllocationStatus::from_str_lossy(&status_str),
            source_transaction_ref: row.get("source_transaction_ref")?,
            transaction_type: row.get("transaction_type")?,
            allocation_date: row.get("allocation_date")?,
            created_at: row.get("created_at")?,
        })
    }

    /// 插入分配记录(测试数据/上游写入路径)
    pub fn insert_allocation(&self, record: &AllocationRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO lot_allocation (
                allocation_id, lot_id, board_feet, quantity,
                status, source_transaction_ref, transaction_type,
                allocation_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.allocation_id,
                record.lot_id,
                record.board_feet,
                record.quantity,
                record.status.as_str(),
                record.source_transaction_ref,
                record.transaction_type,
                record.allocation_date,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    /// 查询某批次的全部分配记录(按创建时间排序)
    pub fn list_for_lot(&self, lot_id: &str) -> RepositoryResult<Vec<AllocationRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM lot_allocation WHERE lot_id = ?1 ORDER BY created_at, allocation_id",
        )?;
        let rows = stmt.query_map(params![lot_id], Self::map_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// 汇总某批次 CONSUMED 状态分配记录的板英尺
    pub fn sum_consumed_board_feet(&self, lot_id: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let sum: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(board_feet), 0.0)
            FROM lot_allocation
            WHERE lot_id = ?1 AND status = 'CONSUMED'
            "#,
            params![lot_id],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    /// 统计某批次 board_feet < 0 的有效分配记录数
    ///
    /// 说明: 仅统计 ALLOCATED/CONSUMED,已作废记录不参与完整性判断
    pub fn count_negative_allocations(&self, lot_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM lot_allocation
            WHERE lot_id = ?1
              AND board_feet < 0
              AND status IN ('ALLOCATED', 'CONSUMED')
            "#,
            params![lot_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 汇总某批次 ALLOCATED/CONSUMED 状态分配记录的件数
    pub fn sum_allocated_pieces(&self, lot_id: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let sum: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(quantity), 0.0)
            FROM lot_allocation
            WHERE lot_id = ?1 AND status IN ('ALLOCATED', 'CONSUMED')
            "#,
            params![lot_id],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    /// 统计某批次孤立分配记录数
    ///
    /// 定义: 非 INITIAL 类型且来源事务引用为空(NULL 或空白)
    pub fn count_orphaned_allocations(&self, lot_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM lot_allocation
            WHERE lot_id = ?1
              AND transaction_type != ?2
              AND (source_transaction_ref IS NULL OR TRIM(source_transaction_ref) = '')
            "#,
            params![lot_id, TRANSACTION_TYPE_INITIAL],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
