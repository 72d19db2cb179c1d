// ==========================================
// 木材理货台账系统 - 理货单领域模型
// ==========================================
// 红线: 台账是唯一事实层,对账引擎只做单字段修正
// 对齐: tally_lot 表
// ==========================================

use crate::domain::types::LotStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Lot - 理货单(木材批次)
// ==========================================
// 用途: 收货理货时创建,分配/消耗事件递减余额
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    // ===== 主键与标识 =====
    pub lot_id: String, // 批次唯一标识
    pub lot_no: String, // 批次号(人工可读)

    // ===== 关联信息 =====
    pub item_id: String,             // 物料引用
    pub location_id: Option<String>, // 库位引用

    // ===== 板英尺数量 =====
    pub original_bf: f64,  // 原始板英尺
    pub remaining_bf: f64, // 剩余板英尺(不变式: 0 <= remaining <= original)

    // ===== 件数 =====
    pub original_pieces: f64,  // 原始件数
    pub remaining_pieces: f64, // 剩余件数
    pub bf_per_piece: f64,     // 单件板英尺

    // ===== 状态 =====
    pub status: LotStatus, // 批次状态

    // ===== 时间信息 =====
    pub tally_date: Option<NaiveDate>, // 理货日期
    pub created_at: DateTime<Utc>,     // 记录创建时间
    pub updated_at: DateTime<Utc>,     // 记录更新时间
}

impl Lot {
    /// 按剩余板英尺推导期望状态
    ///
    /// # 推导表
    /// - remaining_bf <= 0            -> CONSUMED
    /// - 0 < remaining < original 且当前为 ACTIVE  -> PARTIAL
    /// - remaining == original 且当前为 PARTIAL    -> ACTIVE
    /// - 其余情况保持当前状态不变
    pub fn expected_status(&self) -> LotStatus {
        if self.remaining_bf <= 0.0 {
            LotStatus::Consumed
        } else if self.remaining_bf < self.original_bf && self.status == LotStatus::Active {
            LotStatus::Partial
        } else if self.remaining_bf == self.original_bf && self.status == LotStatus::Partial {
            LotStatus::Active
        } else {
            self.status
        }
    }

    /// 是否参与对账（VOID/CLOSED 排除）
    pub fn is_reconcilable(&self) -> bool {
        !matches!(self.status, LotStatus::Void | LotStatus::Closed)
    }

    /// 将剩余板英尺钳制到合法区间 [0, original_bf]
    ///
    /// 不变式: 余额永远不允许为负,也不允许超过原始量
    pub fn clamp_remaining_bf(&self, value: f64) -> f64 {
        value.max(0.0).min(self.original_bf)
    }
}
