// ==========================================
// 木材理货台账系统 - 对账结果领域模型
// ==========================================
// 用途: 单批次检查结果 / 修正结果 / 整体对账报告
// 红线: 报告追加写,生成后不可变(审计链)
// ==========================================

use crate::domain::discrepancy::Discrepancy;
use crate::domain::types::{CheckKind, DiscrepancyKind, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// CheckOutcome - 单项检查结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub check: CheckKind,               // 检查类型
    pub passed: bool,                   // 是否通过
    pub details: serde_json::Value,     // 过程数据(可解释性)
    pub error: Option<String>,          // 检查自身失败时的错误信息
}

impl CheckOutcome {
    /// 通过
    pub fn passed(check: CheckKind, details: serde_json::Value) -> Self {
        Self {
            check,
            passed: true,
            details,
            error: None,
        }
    }

    /// 未通过(发现差异)
    pub fn failed(check: CheckKind, details: serde_json::Value) -> Self {
        Self {
            check,
            passed: false,
            details,
            error: None,
        }
    }

    /// 检查自身执行失败(如台账读取错误)
    ///
    /// 约束: 单项检查失败不阻断同批次的其他检查
    pub fn errored(check: CheckKind, message: String) -> Self {
        Self {
            check,
            passed: false,
            details: serde_json::Value::Null,
            error: Some(message),
        }
    }
}

// ==========================================
// CorrectionOutcome - 单条修正结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    pub lot_id: String,          // 批次
    pub kind: DiscrepancyKind,   // 触发修正的差异类型
    pub field: String,           // 被写字段
    pub old_value: String,       // 修正前值
    pub new_value: String,       // 修正后值
    pub success: bool,           // 写入是否成功
    pub error: Option<String>,   // 失败原因(success=false 时)
}

// ==========================================
// LotReconcileResult - 单批次对账结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotReconcileResult {
    pub lot_id: String,
    pub lot_no: String,
    pub checks: Vec<CheckOutcome>,
    pub discrepancies: Vec<Discrepancy>,
    pub corrections: Vec<CorrectionOutcome>,
    /// 批次级未捕获错误(该批次不贡献差异/修正,但不中断整批)
    pub error: Option<String>,
}

impl LotReconcileResult {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty() && self.error.is_none()
    }
}

// ==========================================
// ReconciliationReport - 对账报告(每次运行一份)
// ==========================================
// 生命周期: 运行结束时生成并持久化,之后不再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub report_id: String,          // 报告ID(UUID)
    pub run_at: DateTime<Utc>,      // 运行时间戳

    // ===== 批次计数 =====
    pub total_lots: i64,        // 检查批次总数
    pub clean_lots: i64,        // 无差异批次数
    pub lots_with_issues: i64,  // 有差异批次数

    // ===== 差异统计 =====
    pub severity_counts: BTreeMap<Severity, i64>,      // 按严重等级计数
    pub kind_counts: BTreeMap<DiscrepancyKind, i64>,   // 按差异类型计数

    // ===== 修正统计 =====
    pub corrections_applied: i64, // 修正成功数
    pub corrections_failed: i64,  // 修正失败数

    // ===== 明细 =====
    pub discrepancies: Vec<Discrepancy>,    // 差异明细(可能按配置上限截断,计数始终精确)
    pub corrections: Vec<CorrectionOutcome>, // 修正明细
    pub execution_errors: Vec<String>,      // 执行层错误(枚举失败/批次级失败等)
}

impl ReconciliationReport {
    /// 严重等级计数(缺省为 0)
    pub fn severity_count(&self, severity: Severity) -> i64 {
        self.severity_counts.get(&severity).copied().unwrap_or(0)
    }

    /// 差异类型计数(缺省为 0)
    pub fn kind_count(&self, kind: DiscrepancyKind) -> i64 {
        self.kind_counts.get(&kind).copied().unwrap_or(0)
    }

    /// 是否需要触发告警: 存在 ERROR 或 CRITICAL 差异
    pub fn needs_alert(&self) -> bool {
        self.severity_count(Severity::Error) > 0 || self.severity_count(Severity::Critical) > 0
    }
}
