// ==========================================
// 木材理货台账系统 - 引擎层
// ==========================================
// 职责: 对账业务规则与运行编排,不拼 SQL
// 红线: Engine 不拼 SQL, 所有差异必须可解释 (detail 载荷)
// 红线: 单批次失败绝不中断整体运行
// ==========================================

pub mod aggregate;
pub mod checks;
pub mod context;
pub mod correction;
pub mod orchestrator;
pub mod ports;
pub mod processor;
pub mod report;

// 重导出核心引擎
pub use aggregate::RunAccumulator;
pub use checks::{
    check_allocation_integrity, check_balance, check_orphans, check_status, CheckEvaluation,
    BALANCE_ERROR_VARIANCE_RATIO, BALANCE_TOLERANCE_BF,
};
pub use context::RunContext;
pub use correction::CorrectionPolicy;
pub use orchestrator::ReconcileOrchestrator;
pub use ports::{LedgerReader, LedgerWriter, ReportStore};
pub use processor::LotProcessor;
pub use report::ReportBuilder;
