// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

use chrono::Utc;
use lumber_tally::db;
use lumber_tally::domain::{AllocationRecord, AllocationStatus, Lot, LotStatus};
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接(测试中各仓储共用)
pub fn open_shared_connection(db_path: &str) -> Arc<Mutex<Connection>> {
    let conn = db::open_sqlite_connection(db_path).expect("Failed to open test db");
    Arc::new(Mutex::new(conn))
}

/// 构造理货单测试数据
pub fn make_lot(lot_id: &str, original_bf: f64, remaining_bf: f64, status: LotStatus) -> Lot {
    Lot {
        lot_id: lot_id.to_string(),
        lot_no: format!("TS-{}", lot_id),
        item_id: "ITEM-OAK-2X4".to_string(),
        location_id: Some("YARD-A".to_string()),
        original_bf,
        remaining_bf,
        original_pieces: 100.0,
        remaining_pieces: 60.0,
        bf_per_piece: original_bf / 100.0,
        status,
        tally_date: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// 构造分配记录测试数据
pub fn make_allocation(
    allocation_id: &str,
    lot_id: &str,
    board_feet: f64,
    status: AllocationStatus,
    transaction_type: &str,
    source_ref: Option<&str>,
) -> AllocationRecord {
    AllocationRecord {
        allocation_id: allocation_id.to_string(),
        lot_id: lot_id.to_string(),
        board_feet,
        quantity: board_feet / 10.0,
        status,
        source_transaction_ref: source_ref.map(|s| s.to_string()),
        transaction_type: transaction_type.to_string(),
        allocation_date: None,
        created_at: Utc::now(),
    }
}
