// ==========================================
// 木材理货台账系统 - 分配记录领域模型
// ==========================================
// 红线: 分配记录对本子系统只读,对账引擎绝不改写分配记录
// 对齐: lot_allocation 表
// ==========================================

use crate::domain::types::{AllocationStatus, TRANSACTION_TYPE_INITIAL};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// AllocationRecord - 批次分配记录
// ==========================================
// 用途: 每次预留/消耗事件产生一条记录,关联消耗方事务
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRecord {
    // ===== 主键与关联 =====
    pub allocation_id: String, // 分配记录唯一标识
    pub lot_id: String,        // 所属批次(FK)

    // ===== 数量 =====
    pub board_feet: f64, // 消耗的板英尺(ALLOCATED/CONSUMED 状态下应 >= 0)
    pub quantity: f64,   // 件数

    // ===== 状态与来源 =====
    pub status: AllocationStatus,               // 分配状态
    pub source_transaction_ref: Option<String>, // 来源事务引用(非 INITIAL 必填)
    pub transaction_type: String,               // 事务类型(INITIAL/SALES_ORDER/WORK_ORDER/...)

    // ===== 时间信息 =====
    pub allocation_date: Option<NaiveDate>, // 分配日期
    pub created_at: DateTime<Utc>,          // 记录创建时间
}

impl AllocationRecord {
    /// 是否为孤立记录: 非 INITIAL 类型却缺少来源事务引用
    pub fn is_orphaned(&self) -> bool {
        if self.transaction_type == TRANSACTION_TYPE_INITIAL {
            return false;
        }
        match &self.source_transaction_ref {
            Some(r) => r.trim().is_empty(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_alloc(transaction_type: &str, source_ref: Option<&str>) -> AllocationRecord {
        AllocationRecord {
            allocation_id: "AL-1".to_string(),
            lot_id: "LOT-1".to_string(),
            board_feet: 100.0,
            quantity: 10.0,
            status: AllocationStatus::Consumed,
            source_transaction_ref: source_ref.map(|s| s.to_string()),
            transaction_type: transaction_type.to_string(),
            allocation_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_initial_without_source_not_orphaned() {
        assert!(!make_alloc("INITIAL", None).is_orphaned());
    }

    #[test]
    fn test_sales_order_without_source_is_orphaned() {
        assert!(make_alloc("SALES_ORDER", None).is_orphaned());
        assert!(make_alloc("SALES_ORDER", Some("  ")).is_orphaned());
    }

    #[test]
    fn test_sales_order_with_source_not_orphaned() {
        assert!(!make_alloc("SALES_ORDER", Some("SO-1001")).is_orphaned());
    }
}
