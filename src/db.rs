// ==========================================
// 木材理货台账系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供台账 schema 的幂等初始化（CREATE TABLE IF NOT EXISTS）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化台账 schema（幂等）
///
/// # 表清单
/// - schema_version: schema 版本记录
/// - config_scope / config_kv: 配置存储（key-value + scope）
/// - tally_lot: 理货单（木材批次台账）
/// - lot_allocation: 批次分配记录（对账子系统只读）
/// - recon_report: 对账报告（追加写，不可变审计记录）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS tally_lot (
            lot_id TEXT PRIMARY KEY,
            lot_no TEXT NOT NULL,
            item_id TEXT NOT NULL,
            location_id TEXT,
            original_bf REAL NOT NULL,
            remaining_bf REAL NOT NULL,
            original_pieces REAL NOT NULL,
            remaining_pieces REAL NOT NULL,
            bf_per_piece REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            tally_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tally_lot_status ON tally_lot(status);

        CREATE TABLE IF NOT EXISTS lot_allocation (
            allocation_id TEXT PRIMARY KEY,
            lot_id TEXT NOT NULL REFERENCES tally_lot(lot_id) ON DELETE CASCADE,
            board_feet REAL NOT NULL,
            quantity REAL NOT NULL,
            status TEXT NOT NULL,
            source_transaction_ref TEXT,
            transaction_type TEXT NOT NULL,
            allocation_date TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_lot_allocation_lot ON lot_allocation(lot_id);

        CREATE TABLE IF NOT EXISTS recon_report (
            report_id TEXT PRIMARY KEY,
            run_at TEXT NOT NULL,
            total_lots INTEGER NOT NULL,
            clean_lots INTEGER NOT NULL,
            lots_with_issues INTEGER NOT NULL,
            corrections_applied INTEGER NOT NULL,
            corrections_failed INTEGER NOT NULL,
            severity_counts TEXT NOT NULL,
            kind_counts TEXT NOT NULL,
            discrepancies TEXT NOT NULL,
            execution_errors TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}
