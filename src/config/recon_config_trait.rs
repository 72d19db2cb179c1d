// ==========================================
// 木材理货台账系统 - 对账配置读取 Trait
// ==========================================
// 职责: 定义对账引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ReconConfigReader Trait
// ==========================================
// 用途: 对账引擎所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ReconConfigReader: Send + Sync {
    /// 是否启用自动修正
    ///
    /// # 默认值
    /// - false（只报告不修正）
    async fn is_auto_correct_enabled(&self) -> Result<bool, Box<dyn Error>>;

    /// 告警接收人（邮箱/用户标识）
    ///
    /// # 返回
    /// - None: 未配置接收人,告警仅落日志
    async fn get_admin_recipient(&self) -> Result<Option<String>, Box<dyn Error>>;

    /// 批次枚举的分页大小
    ///
    /// # 默认值
    /// - 500
    async fn get_page_size(&self) -> Result<usize, Box<dyn Error>>;

    /// 批次并行处理度
    ///
    /// # 默认值
    /// - 8
    async fn get_concurrency(&self) -> Result<usize, Box<dyn Error>>;

    /// 报告中保留的差异明细上限
    ///
    /// 说明: 仅截断明细列表,各项计数始终精确
    ///
    /// # 默认值
    /// - 1000
    async fn get_max_tracked_discrepancies(&self) -> Result<usize, Box<dyn Error>>;
}
