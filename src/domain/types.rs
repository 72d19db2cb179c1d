// ==========================================
// 木材理货台账系统 - 领域类型定义
// ==========================================
// 红线: 封闭枚举,不用字符串约定
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 批次状态 (Lot Status)
// ==========================================
// 生命周期: ACTIVE -> PARTIAL -> CONSUMED
// VOID/CLOSED 批次不参与对账
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotStatus {
    Active,   // 活跃(未消耗)
    Partial,  // 部分消耗
    Consumed, // 已消耗完
    Void,     // 作废
    Closed,   // 关闭
}

impl LotStatus {
    /// 转换为字符串（用于数据库存储）
    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Active => "ACTIVE",
            LotStatus::Partial => "PARTIAL",
            LotStatus::Consumed => "CONSUMED",
            LotStatus::Void => "VOID",
            LotStatus::Closed => "CLOSED",
        }
    }

    /// 字符串转 LotStatus（未知值归为 CLOSED，不参与对账）
    pub fn from_str_lossy(s: &str) -> LotStatus {
        match s {
            "ACTIVE" => LotStatus::Active,
            "PARTIAL" => LotStatus::Partial,
            "CONSUMED" => LotStatus::Consumed,
            "VOID" => LotStatus::Void,
            _ => LotStatus::Closed,
        }
    }
}

impl fmt::Display for LotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 分配记录状态 (Allocation Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    Allocated, // 已预留
    Consumed,  // 已消耗
    Voided,    // 已作废
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Allocated => "ALLOCATED",
            AllocationStatus::Consumed => "CONSUMED",
            AllocationStatus::Voided => "VOIDED",
        }
    }

    pub fn from_str_lossy(s: &str) -> AllocationStatus {
        match s {
            "ALLOCATED" => AllocationStatus::Allocated,
            "CONSUMED" => AllocationStatus::Consumed,
            _ => AllocationStatus::Voided,
        }
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 严重等级 (Severity)
// ==========================================
// 红线: 等级制有序,INFO < WARNING < ERROR < CRITICAL
// 自动修正门控: 仅 ERROR 以下等级允许自动修正
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,     // 提示
    Warning,  // 警告
    Error,    // 错误
    Critical, // 严重
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// 是否允许自动修正（严格低于 ERROR）
    pub fn allows_auto_correct(&self) -> bool {
        *self < Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 差异类型 (Discrepancy Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyKind {
    BalanceMismatch,     // 余额不一致
    NegativeAllocations, // 负数分配记录
    OverAllocation,      // 超额分配
    StatusMismatch,      // 状态不一致
    OrphanedAllocations, // 孤立分配记录
}

impl DiscrepancyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyKind::BalanceMismatch => "BALANCE_MISMATCH",
            DiscrepancyKind::NegativeAllocations => "NEGATIVE_ALLOCATIONS",
            DiscrepancyKind::OverAllocation => "OVER_ALLOCATION",
            DiscrepancyKind::StatusMismatch => "STATUS_MISMATCH",
            DiscrepancyKind::OrphanedAllocations => "ORPHANED_ALLOCATIONS",
        }
    }

    /// 全部差异类型（报告按类型计数用）
    pub fn all() -> [DiscrepancyKind; 5] {
        [
            DiscrepancyKind::BalanceMismatch,
            DiscrepancyKind::NegativeAllocations,
            DiscrepancyKind::OverAllocation,
            DiscrepancyKind::StatusMismatch,
            DiscrepancyKind::OrphanedAllocations,
        ]
    }
}

impl fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 一致性检查类型 (Check Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckKind {
    Balance,             // 余额核对
    AllocationIntegrity, // 分配完整性
    Status,              // 状态校验
    Orphans,             // 孤立记录检测
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Balance => "BALANCE",
            CheckKind::AllocationIntegrity => "ALLOCATION_INTEGRITY",
            CheckKind::Status => "STATUS",
            CheckKind::Orphans => "ORPHANS",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 事务类型常量
// ==========================================
// 说明: 事务类型来源于上游单据,集合开放(销售单/工单等),
// 仅 INITIAL 类型允许没有来源事务引用
pub const TRANSACTION_TYPE_INITIAL: &str = "INITIAL";
