// ==========================================
// 木材理货台账系统 - 告警投递
// ==========================================
// 职责: 告警消息结构与投递接口
// 红线: 投递失败只记日志,不向调用方抛错
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// AlertMessage - 告警消息
// ==========================================
// 内容约束: 只携带汇总统计,绝不携带逐批次明细
// (明细保留在持久化报告中)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertMessage {
    pub recipient: String, // 接收人
    pub subject: String,   // 标题
    pub body: String,      // 正文(汇总统计)
}

// ==========================================
// AlertSink Trait - 告警投递接口
// ==========================================
// 实现者: 外部邮件通道适配器 / LogAlertSink
pub trait AlertSink: Send + Sync {
    /// 投递一条告警(尽力而为)
    ///
    /// # 约束
    /// - 不返回错误: 投递失败由实现方记日志
    fn send_alert(&self, message: &AlertMessage);
}

// ==========================================
// LogAlertSink - 日志告警投递
// ==========================================
// 用途: 默认实现,把告警写入结构化日志;
// 邮件通道是外部协作方,未接入时也要保证告警可见
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn send_alert(&self, message: &AlertMessage) {
        tracing::warn!(
            recipient = %message.recipient,
            subject = %message.subject,
            body = %message.body,
            "对账告警"
        );
    }
}
