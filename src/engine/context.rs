// ==========================================
// 木材理货台账系统 - 运行上下文
// ==========================================
// 红线: 不用全局可变状态,配置随上下文显式传递
// ==========================================

use crate::config::ReconConfigReader;
use std::error::Error;

// ==========================================
// RunContext - 单次对账运行的上下文
// ==========================================
// 用途: 运行开始时从配置层快照一次,整个运行期间不变
#[derive(Debug, Clone)]
pub struct RunContext {
    /// 是否启用自动修正
    pub auto_correct_enabled: bool,
    /// 告警接收人(None 则告警仅落日志)
    pub admin_recipient: Option<String>,
    /// 批次枚举分页大小
    pub page_size: usize,
    /// 批次并行处理度
    pub concurrency: usize,
    /// 报告保留的差异明细上限(计数不受影响)
    pub max_tracked_discrepancies: usize,
}

impl RunContext {
    /// 从配置层构建运行上下文
    pub async fn from_config(config: &dyn ReconConfigReader) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            auto_correct_enabled: config.is_auto_correct_enabled().await?,
            admin_recipient: config.get_admin_recipient().await?,
            page_size: config.get_page_size().await?,
            concurrency: config.get_concurrency().await?,
            max_tracked_discrepancies: config.get_max_tracked_discrepancies().await?,
        })
    }

    /// 默认上下文(测试/演示用,不开自动修正)
    pub fn defaults() -> Self {
        Self {
            auto_correct_enabled: false,
            admin_recipient: None,
            page_size: 500,
            concurrency: 8,
            max_tracked_discrepancies: 1000,
        }
    }

    /// 打开自动修正的上下文(测试用)
    pub fn with_auto_correct(mut self, enabled: bool) -> Self {
        self.auto_correct_enabled = enabled;
        self
    }
}
