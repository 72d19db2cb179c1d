// ==========================================
// 木材理货台账系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::recon_config_trait::ReconConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    /// 自动修正开关
    pub const AUTO_CORRECT_ENABLED: &str = "recon/auto_correct_enabled";
    /// 告警接收人
    pub const ADMIN_RECIPIENT: &str = "recon/admin_recipient";
    /// 分页大小
    pub const PAGE_SIZE: &str = "recon/page_size";
    /// 并行处理度
    pub const CONCURRENCY: &str = "recon/concurrency";
    /// 差异明细保留上限
    pub const MAX_TRACKED_DISCREPANCIES: &str = "recon/max_tracked_discrepancies";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 参数
    /// - key: 配置键
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（scope_id='global'，UPSERT 语义）
    ///
    /// # 用途
    /// - 初始化/运维脚本与测试写入配置
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ReconConfigReader for ConfigManager {
    async fn is_auto_correct_enabled(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::AUTO_CORRECT_ENABLED, "false")?;
        Ok(value.trim().eq_ignore_ascii_case("true"))
    }

    async fn get_admin_recipient(&self) -> Result<Option<String>, Box<dyn Error>> {
        let value = self.get_config_value(config_keys::ADMIN_RECIPIENT)?;
        Ok(value.filter(|v| !v.trim().is_empty()))
    }

    async fn get_page_size(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::PAGE_SIZE, "500")?;
        Ok(value.parse::<usize>().unwrap_or(500).max(1))
    }

    async fn get_concurrency(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::CONCURRENCY, "8")?;
        Ok(value.parse::<usize>().unwrap_or(8).max(1))
    }

    async fn get_max_tracked_discrepancies(&self) -> Result<usize, Box<dyn Error>> {
        let value =
            self.get_config_or_default(config_keys::MAX_TRACKED_DISCREPANCIES, "1000")?;
        Ok(value.parse::<usize>().unwrap_or(1000))
    }
}
