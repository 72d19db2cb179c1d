// ==========================================
// Repository 层集成测试
// ==========================================
// 测试目标: 验证理货单/分配记录/对账报告的持久化与聚合查询
// ==========================================

mod test_helpers;

use chrono::Utc;
use lumber_tally::domain::{
    AllocationStatus, CorrectionPatch, DiscrepancyKind, LotStatus, ReconciliationReport, Severity,
};
use lumber_tally::logging;
use lumber_tally::repository::{
    AllocationRepository, LotRepository, ReconReportRepository, RepositoryError,
};
use std::collections::BTreeMap;

// ==========================================
// 理货单仓储
// ==========================================

#[test]
fn test_lot_insert_and_get_roundtrip() {
    logging::init_test();
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = LotRepository::new(&db_path).expect("Failed to create lot repo");

    let lot = test_helpers::make_lot("LOT-001", 1000.0, 600.0, LotStatus::Partial);
    repo.insert_lot(&lot).expect("insert failed");

    let loaded = repo.get_lot("LOT-001").expect("get failed");
    assert_eq!(loaded.lot_no, lot.lot_no);
    assert_eq!(loaded.status, LotStatus::Partial);
    assert!((loaded.remaining_bf - 600.0).abs() < f64::EPSILON);
}

#[test]
fn test_get_missing_lot_returns_not_found() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = LotRepository::new(&db_path).expect("Failed to create lot repo");

    let err = repo.get_lot("NO-SUCH-LOT").unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[test]
fn test_cursor_excludes_void_and_closed_lots() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = LotRepository::new(&db_path).expect("Failed to create lot repo");

    repo.insert_lot(&test_helpers::make_lot("LOT-A", 1000.0, 600.0, LotStatus::Active))
        .unwrap();
    repo.insert_lot(&test_helpers::make_lot("LOT-B", 1000.0, 0.0, LotStatus::Void))
        .unwrap();
    repo.insert_lot(&test_helpers::make_lot("LOT-C", 1000.0, 0.0, LotStatus::Closed))
        .unwrap();
    repo.insert_lot(&test_helpers::make_lot("LOT-D", 500.0, 500.0, LotStatus::Partial))
        .unwrap();

    let lots: Vec<_> = repo
        .iter_active_lots(10)
        .collect::<Result<Vec<_>, _>>()
        .expect("cursor failed");

    let ids: Vec<&str> = lots.iter().map(|l| l.lot_id.as_str()).collect();
    assert_eq!(ids, vec!["LOT-A", "LOT-D"]);
    assert_eq!(repo.count_active_lots().unwrap(), 2);
}

#[test]
fn test_cursor_pages_across_boundary_in_stable_order() {
    // page_size=2, 5 个批次: 游标跨页且顺序稳定
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = LotRepository::new(&db_path).expect("Failed to create lot repo");

    for i in 0..5 {
        repo.insert_lot(&test_helpers::make_lot(
            &format!("LOT-{:03}", i),
            1000.0,
            1000.0,
            LotStatus::Active,
        ))
        .unwrap();
    }

    let lots: Vec<_> = repo
        .iter_active_lots(2)
        .collect::<Result<Vec<_>, _>>()
        .expect("cursor failed");

    assert_eq!(lots.len(), 5);
    let ids: Vec<&str> = lots.iter().map(|l| l.lot_id.as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[test]
fn test_apply_correction_clamps_remaining_bf() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = LotRepository::new(&db_path).expect("Failed to create lot repo");

    repo.insert_lot(&test_helpers::make_lot("LOT-001", 1000.0, 600.0, LotStatus::Partial))
        .unwrap();

    // 钳制上界: 修正值超过 original_bf 时落在 original_bf
    repo.apply_correction(
        "LOT-001",
        &CorrectionPatch::RemainingBf {
            current: 600.0,
            correct: 1500.0,
        },
    )
    .expect("correction failed");
    let lot = repo.get_lot("LOT-001").unwrap();
    assert!((lot.remaining_bf - 1000.0).abs() < f64::EPSILON);

    // 钳制下界: 负修正值落在 0
    repo.apply_correction(
        "LOT-001",
        &CorrectionPatch::RemainingBf {
            current: 1000.0,
            correct: -25.0,
        },
    )
    .expect("correction failed");
    let lot = repo.get_lot("LOT-001").unwrap();
    assert!(lot.remaining_bf.abs() < f64::EPSILON);
}

#[test]
fn test_apply_status_correction() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = LotRepository::new(&db_path).expect("Failed to create lot repo");

    repo.insert_lot(&test_helpers::make_lot("LOT-001", 1000.0, 0.0, LotStatus::Active))
        .unwrap();

    repo.apply_correction(
        "LOT-001",
        &CorrectionPatch::Status {
            current: LotStatus::Active,
            correct: LotStatus::Consumed,
        },
    )
    .expect("correction failed");

    assert_eq!(repo.get_lot("LOT-001").unwrap().status, LotStatus::Consumed);
}

#[test]
fn test_apply_correction_on_missing_lot_is_not_found() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = LotRepository::new(&db_path).expect("Failed to create lot repo");

    let err = repo
        .apply_correction(
            "NO-SUCH-LOT",
            &CorrectionPatch::Status {
                current: LotStatus::Active,
                correct: LotStatus::Consumed,
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

// ==========================================
// 分配记录仓储 - 聚合查询
// ==========================================

#[test]
fn test_allocation_aggregates() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let conn = test_helpers::open_shared_connection(&db_path);
    let lot_repo = LotRepository::from_connection(conn.clone());
    let alloc_repo = AllocationRepository::from_connection(conn);

    lot_repo
        .insert_lot(&test_helpers::make_lot("LOT-001", 1000.0, 600.0, LotStatus::Partial))
        .unwrap();

    // CONSUMED 两笔 (300 + 100), ALLOCATED 一笔(不计入消耗合计), VOIDED 一笔(完全不计)
    alloc_repo
        .insert_allocation(&test_helpers::make_allocation(
            "AL-1", "LOT-001", 300.0, AllocationStatus::Consumed, "SALES_ORDER", Some("SO-1"),
        ))
        .unwrap();
    alloc_repo
        .insert_allocation(&test_helpers::make_allocation(
            "AL-2", "LOT-001", 100.0, AllocationStatus::Consumed, "WORK_ORDER", Some("WO-1"),
        ))
        .unwrap();
    alloc_repo
        .insert_allocation(&test_helpers::make_allocation(
            "AL-3", "LOT-001", 50.0, AllocationStatus::Allocated, "SALES_ORDER", Some("SO-2"),
        ))
        .unwrap();
    alloc_repo
        .insert_allocation(&test_helpers::make_allocation(
            "AL-4", "LOT-001", 999.0, AllocationStatus::Voided, "SALES_ORDER", Some("SO-3"),
        ))
        .unwrap();

    let consumed = alloc_repo.sum_consumed_board_feet("LOT-001").unwrap();
    assert!((consumed - 400.0).abs() < 1e-9);

    // ALLOCATED + CONSUMED 的件数合计 (quantity = board_feet / 10)
    let pieces = alloc_repo.sum_allocated_pieces("LOT-001").unwrap();
    assert!((pieces - 45.0).abs() < 1e-9);

    assert_eq!(alloc_repo.count_negative_allocations("LOT-001").unwrap(), 0);
    assert_eq!(alloc_repo.list_for_lot("LOT-001").unwrap().len(), 4);
}

#[test]
fn test_negative_allocation_excludes_voided() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let conn = test_helpers::open_shared_connection(&db_path);
    let lot_repo = LotRepository::from_connection(conn.clone());
    let alloc_repo = AllocationRepository::from_connection(conn);

    lot_repo
        .insert_lot(&test_helpers::make_lot("LOT-001", 1000.0, 600.0, LotStatus::Partial))
        .unwrap();
    // 有效负数一笔, 已作废负数一笔(不计)
    alloc_repo
        .insert_allocation(&test_helpers::make_allocation(
            "AL-1", "LOT-001", -40.0, AllocationStatus::Consumed, "SALES_ORDER", Some("SO-1"),
        ))
        .unwrap();
    alloc_repo
        .insert_allocation(&test_helpers::make_allocation(
            "AL-2", "LOT-001", -80.0, AllocationStatus::Voided, "SALES_ORDER", Some("SO-2"),
        ))
        .unwrap();

    assert_eq!(alloc_repo.count_negative_allocations("LOT-001").unwrap(), 1);
}

#[test]
fn test_orphan_count_respects_initial_exemption() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let conn = test_helpers::open_shared_connection(&db_path);
    let lot_repo = LotRepository::from_connection(conn.clone());
    let alloc_repo = AllocationRepository::from_connection(conn);

    lot_repo
        .insert_lot(&test_helpers::make_lot("LOT-001", 1000.0, 600.0, LotStatus::Partial))
        .unwrap();
    // INITIAL 无来源: 豁免
    alloc_repo
        .insert_allocation(&test_helpers::make_allocation(
            "AL-1", "LOT-001", 1000.0, AllocationStatus::Allocated, "INITIAL", None,
        ))
        .unwrap();
    // 非 INITIAL 无来源: 孤立
    alloc_repo
        .insert_allocation(&test_helpers::make_allocation(
            "AL-2", "LOT-001", 100.0, AllocationStatus::Consumed, "SALES_ORDER", None,
        ))
        .unwrap();
    // 非 INITIAL 空白来源: 孤立
    alloc_repo
        .insert_allocation(&test_helpers::make_allocation(
            "AL-3", "LOT-001", 100.0, AllocationStatus::Consumed, "WORK_ORDER", Some("   "),
        ))
        .unwrap();
    // 非 INITIAL 有来源: 正常
    alloc_repo
        .insert_allocation(&test_helpers::make_allocation(
            "AL-4", "LOT-001", 100.0, AllocationStatus::Consumed, "SALES_ORDER", Some("SO-9"),
        ))
        .unwrap();

    assert_eq!(alloc_repo.count_orphaned_allocations("LOT-001").unwrap(), 2);
}

// ==========================================
// 对账报告仓储
// ==========================================

#[test]
fn test_report_persist_and_reload() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = ReconReportRepository::new(&db_path).expect("Failed to create report repo");

    let mut severity_counts = BTreeMap::new();
    severity_counts.insert(Severity::Warning, 3i64);
    severity_counts.insert(Severity::Critical, 1i64);
    let mut kind_counts = BTreeMap::new();
    kind_counts.insert(DiscrepancyKind::BalanceMismatch, 3i64);
    kind_counts.insert(DiscrepancyKind::OverAllocation, 1i64);

    let report = ReconciliationReport {
        report_id: "RPT-001".to_string(),
        run_at: Utc::now(),
        total_lots: 10,
        clean_lots: 7,
        lots_with_issues: 3,
        severity_counts,
        kind_counts,
        corrections_applied: 2,
        corrections_failed: 1,
        discrepancies: Vec::new(),
        corrections: Vec::new(),
        execution_errors: vec!["批次枚举失败: 测试".to_string()],
    };

    let report_id = repo.insert_report(&report).expect("insert failed");
    assert_eq!(report_id, "RPT-001");
    assert_eq!(repo.count_reports().unwrap(), 1);

    let loaded = repo.get_report("RPT-001").expect("get failed");
    assert_eq!(loaded.total_lots, 10);
    assert_eq!(loaded.severity_count(Severity::Warning), 3);
    assert_eq!(loaded.kind_count(DiscrepancyKind::OverAllocation), 1);
    assert_eq!(loaded.execution_errors.len(), 1);
    assert!(loaded.needs_alert());
}
