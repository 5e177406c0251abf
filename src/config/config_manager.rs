// ==========================================
// SportChef 赛事编排系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::config::config_keys;
use crate::config::config_trait::SchedulingConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::sync::{Arc, Mutex};

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

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_string(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 读取整数配置, 缺省时返回 default
    pub fn get_i64_or(&self, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
        match self.get_string(key)? {
            Some(s) => Ok(s
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("配置{}解析失败: {}", key, e))?),
            None => Ok(default),
        }
    }

    /// 写入配置 (UPSERT)
    pub fn set_string(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"INSERT INTO config_kv (key, value, updated_at)
               VALUES (?, ?, datetime('now'))
               ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                              updated_at = excluded.updated_at"#,
            params![key, value],
        )?;

        Ok(())
    }

    /// 列出全部配置项
    pub fn list_all(&self) -> Result<Vec<(String, String)>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;
        let entries = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, String)>, _>>()?;

        Ok(entries)
    }
}

// ==========================================
// SchedulingConfigReader 实现
// ==========================================
#[async_trait]
impl SchedulingConfigReader for ConfigManager {
    async fn get_random_seed(&self) -> Result<u64, Box<dyn Error>> {
        // 未配置时固定回退到 0, 保证可复现 (不取时间种子)
        let v = self.get_i64_or(config_keys::SEEDING_RANDOM_SEED, 0)?;
        Ok(v as u64)
    }

    async fn get_default_heat_duration_seconds(&self) -> Result<i64, Box<dyn Error>> {
        self.get_i64_or(config_keys::DEFAULT_HEAT_DURATION_SECONDS, 120)
    }

    async fn get_default_heat_gap_seconds(&self) -> Result<i64, Box<dyn Error>> {
        self.get_i64_or(config_keys::DEFAULT_HEAT_GAP_SECONDS, 60)
    }
}
