// ==========================================
// 木材理货台账系统 - 引擎层端口定义
// ==========================================
// 职责: 定义对账引擎依赖的台账读写接口,实现依赖倒置
// 说明: Engine 层定义 trait,仓储层实现适配
// 红线: Engine 不拼 SQL
// ==========================================

use crate::domain::discrepancy::CorrectionPatch;
use crate::domain::report::ReconciliationReport;
use crate::repository::error::RepositoryResult;
use crate::repository::{AllocationRepository, LotRepository, ReconReportRepository};

// ==========================================
// LedgerReader - 台账聚合读取接口
// ==========================================
// 用途: 四项一致性检查的唯一数据入口(每项检查自行加载所需聚合)
pub trait LedgerReader: Send + Sync {
    /// 某批次 CONSUMED 分配记录的板英尺合计
    fn sum_consumed_board_feet(&self, lot_id: &str) -> RepositoryResult<f64>;

    /// 某批次 board_feet < 0 的有效分配记录数
    fn count_negative_allocations(&self, lot_id: &str) -> RepositoryResult<i64>;

    /// 某批次 ALLOCATED/CONSUMED 分配记录的件数合计
    fn sum_allocated_pieces(&self, lot_id: &str) -> RepositoryResult<f64>;

    /// 某批次孤立分配记录数(非 INITIAL 且无来源事务引用)
    fn count_orphaned_allocations(&self, lot_id: &str) -> RepositoryResult<i64>;
}

impl LedgerReader for AllocationRepository {
    fn sum_consumed_board_feet(&self, lot_id: &str) -> RepositoryResult<f64> {
        AllocationRepository::sum_consumed_board_feet(self, lot_id)
    }

    fn count_negative_allocations(&self, lot_id: &str) -> RepositoryResult<i64> {
        AllocationRepository::count_negative_allocations(self, lot_id)
    }

    fn sum_allocated_pieces(&self, lot_id: &str) -> RepositoryResult<f64> {
        AllocationRepository::sum_allocated_pieces(self, lot_id)
    }

    fn count_orphaned_allocations(&self, lot_id: &str) -> RepositoryResult<i64> {
        AllocationRepository::count_orphaned_allocations(self, lot_id)
    }
}

// ==========================================
// LedgerWriter - 台账单字段写入接口
// ==========================================
// 红线: 对账引擎的唯一写入路径,一次只写一个字段
pub trait LedgerWriter: Send + Sync {
    /// 应用修正补丁(单字段写)
    fn apply_correction(&self, lot_id: &str, patch: &CorrectionPatch) -> RepositoryResult<()>;
}

impl LedgerWriter for LotRepository {
    fn apply_correction(&self, lot_id: &str, patch: &CorrectionPatch) -> RepositoryResult<()> {
        LotRepository::apply_correction(self, lot_id, patch)
    }
}

// ==========================================
// ReportStore - 报告持久化接口
// ==========================================
pub trait ReportStore: Send + Sync {
    /// 持久化对账报告,返回报告ID
    fn insert_report(&self, report: &ReconciliationReport) -> RepositoryResult<String>;
}

impl ReportStore for ReconReportRepository {
    fn insert_report(&self, report: &ReconciliationReport) -> RepositoryResult<String> {
        ReconReportRepository::insert_report(self, report)
    }
}
