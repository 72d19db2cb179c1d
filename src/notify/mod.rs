// ==========================================
// 木材理货台账系统 - 告警通知层
// ==========================================
// 职责: 定义告警投递 trait，实现依赖倒置
// 说明: Engine 层只依赖 AlertSink,实际邮件通道由外部适配器实现
// 红线: 告警投递尽力而为,失败只记日志,绝不中断对账
// ==========================================

pub mod alert;

pub use alert::{AlertMessage, AlertSink, LogAlertSink};
