// ==========================================
// 木材理货台账系统 - 理货单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::discrepancy::CorrectionPatch;
use crate::domain::lot::Lot;
use crate::domain::types::LotStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ==========================================
// LotRepository - 理货单仓储
// ==========================================
/// 理货单仓储
/// 职责: 管理 tally_lot 表的数据访问
/// 红线: 对账引擎只通过 apply_correction 做单字段写入
pub struct LotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LotRepository {
    /// 创建新的 LotRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - RepositoryResult<Self>
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

    /// 行映射: tally_lot -> Lot
    fn map_row(row: &Row) -> rusqlite::Result<Lot> {
        let status_str: String = row.get("status")?;
        Ok(Lot {
            lot_id: row.get("lot_id")?,
            lot_no: row.get("lot_no")?,
            item_id: row.get("item_id")?,
            location_id: row.get("location_id")?,
            original_bf: row.get("original_bf")?,
            remaining_bf: row.get("remaining_bf")?,
            original_pieces: row.get("original_pieces")?,
            remaining_pieces: row.get("remaining_pieces")?,
            bf_per_piece: row.get("bf_per_piece")?,
            status: LotStatus::from_str_lossy(&status_str),
            tally_date: row.get("tally_date")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// 插入理货单
    pub fn insert_lot(&self, lot: &Lot) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO tally_lot (
                lot_id, lot_no, item_id, location_id,
                original_bf, remaining_bf, original_pieces, remaining_pieces,
                bf_per_piece, status, tally_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                lot.lot_id,
                lot.lot_no,
                lot.item_id,
                lot.location_id,
                lot.original_bf,
                lot.remaining_bf,
                lot.original_pieces,
                lot.remaining_pieces,
                lot.bf_per_piece,
                lot.status.as_str(),
                lot.tally_date,
                lot.created_at,
                lot.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按ID查询理货单
    pub fn get_lot(&self, lot_id: &str) -> RepositoryResult<Lot> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT * FROM tally_lot WHERE lot_id = ?1",
            params![lot_id],
            Self::map_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "tally_lot".to_string(),
                id: lot_id.to_string(),
            },
            other => other.into(),
        })
    }

    /// 枚举参与对账的批次(排除 VOID/CLOSED),惰性分页游标
    ///
    /// # 参数
    /// - page_size: 每页批次数(显式参数,不在迭代逻辑里埋上限)
    ///
    /// # 说明
    /// - 游标按 lot_id 做 keyset 分页,可重启、顺序稳定
    /// - 不假设批次总数上限
    pub fn iter_active_lots(&self, page_size: usize) -> LotCursor {
        LotCursor {
            conn: Arc::clone(&self.conn),
            page_size: page_size.max(1),
            last_lot_id: None,
            buffer: VecDeque::new(),
            exhausted: false,
            failed: false,
        }
    }

    /// 应用单字段修正(对账引擎唯一的写入口)
    ///
    /// # 参数
    /// - lot_id: 批次ID
    /// - patch: 修正补丁(剩余板英尺或状态)
    ///
    /// # 说明
    /// - 剩余板英尺写入时钳制到 [0, original_bf],余额永不为负
    /// - 无乐观锁: 并发重跑会收敛到相同修正值(幂等覆盖)
    pub fn apply_correction(&self, lot_id: &str, patch: &CorrectionPatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = match patch {
            CorrectionPatch::RemainingBf { correct, .. } => conn.execute(
                r#"
                UPDATE tally_lot
                SET remaining_bf = MAX(0.0, MIN(?1, original_bf)),
                    updated_at = datetime('now')
                WHERE lot_id = ?2
                "#,
                params![correct, lot_id],
            )?,
            CorrectionPatch::Status { correct, .. } => conn.execute(
                r#"
                UPDATE tally_lot
                SET status = ?1,
                    updated_at = datetime('now')
                WHERE lot_id = ?2
                "#,
                params![correct.as_str(), lot_id],
            )?,
        };

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "tally_lot".to_string(),
                id: lot_id.to_string(),
            });
        }
        Ok(())
    }

    /// 统计参与对账的批次总数(诊断用)
    pub fn count_active_lots(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tally_lot WHERE status NOT IN ('VOID', 'CLOSED')",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ==========================================
// LotCursor - 惰性分页游标
// ==========================================
// 用途: 以标准 Iterator 消费分页结果,替代回调式遍历
pub struct LotCursor {
    conn: Arc<Mutex<Connection>>,
    page_size: usize,
    last_lot_id: Option<String>,
    buffer: VecDeque<Lot>,
    exhausted: bool,
    failed: bool,
}

impl LotCursor {
    /// 拉取下一页到缓冲区
    fn fetch_page(&mut self) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM tally_lot
            WHERE status NOT IN ('VOID', 'CLOSED')
              AND (?1 IS NULL OR lot_id > ?1)
            ORDER BY lot_id
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(
            params![self.last_lot_id, self.page_size as i64],
            LotRepository::map_row,
        )?;

        let mut fetched = 0usize;
        for row in rows {
            let lot = row?;
            self.last_lot_id = Some(lot.lot_id.clone());
            self.buffer.push_back(lot);
            fetched += 1;
        }

        if fetched < self.page_size {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl Iterator for LotCursor {
    type Item = RepositoryResult<Lot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.buffer.is_empty() {
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                // 游标失败后终止迭代,错误上抛一次
                self.failed = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
