// ==========================================
// 木材理货台账系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 台账对账与自动修正引擎 (批处理)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 对账规则与编排
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 告警通知层
pub mod notify;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AllocationStatus, CheckKind, DiscrepancyKind, LotStatus, Severity};

// 领域实体
pub use domain::{
    AllocationRecord, CheckOutcome, CorrectionOutcome, CorrectionPatch, Discrepancy,
    DiscrepancyDetail, Lot, LotReconcileResult, ReconciliationReport,
};

// 引擎
pub use engine::{ReconcileOrchestrator, ReportBuilder, RunContext};

// 仓储
pub use repository::{
    AllocationRepository, LotRepository, ReconReportRepository, RepositoryError, RepositoryResult,
};

// ==========================================
// 全局常量
// ==========================================

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "木材理货台账系统";
