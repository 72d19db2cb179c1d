// ==========================================
// 木材理货台账系统 - 领域层
// ==========================================
// 职责: 实体与类型定义,不含数据访问与业务编排
// ==========================================

pub mod allocation;
pub mod discrepancy;
pub mod lot;
pub mod report;
pub mod types;

// 重导出核心类型
pub use allocation::AllocationRecord;
pub use discrepancy::{CorrectionPatch, Discrepancy, DiscrepancyDetail};
pub use lot::Lot;
pub use report::{CheckOutcome, CorrectionOutcome, LotReconcileResult, ReconciliationReport};
pub use types::{
    AllocationStatus, CheckKind, DiscrepancyKind, LotStatus, Severity, TRANSACTION_TYPE_INITIAL,
};
