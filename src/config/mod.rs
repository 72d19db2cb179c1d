// ==========================================
// 木材理货台账系统 - 配置层
// ==========================================
// 职责: 系统配置读取接口与实现
// ==========================================

pub mod config_manager;
pub mod recon_config_trait;

pub use config_manager::{config_keys, ConfigManager};
pub use recon_config_trait::ReconConfigReader;
