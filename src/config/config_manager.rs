// ==========================================
// 餐厅需求预测系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 规则: 缺失 → 默认值; 格式错误或越界 → 告警 + 默认值
// ==========================================

use crate::config::settings::{
    ForecastConfig, SyncConfig, FAILURE_BACKOFF_SECS_RANGE, HISTORY_WINDOW_DAYS_RANGE,
    HORIZON_DAYS_RANGE, RETENTION_DAYS_RANGE, SYNC_INTERVAL_MINUTES_RANGE,
};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;
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

    /// 从 config_kv 表读取配置值（scope_id='global'）
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

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取并解析配置，缺失或格式错误时返回默认值
    fn get_parsed_or<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 读取并解析配置，超出 bounds 时告警并返回默认值
    fn get_bounded_or<T>(
        &self,
        key: &str,
        default: T,
        bounds: RangeInclusive<T>,
    ) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy + PartialOrd + Display,
    {
        let value = self.get_parsed_or(key, default)?;
        if bounds.contains(&value) {
            Ok(value)
        } else {
            tracing::warn!(
                config_key = key,
                value = %value,
                min = %bounds.start(),
                max = %bounds.end(),
                "配置超出允许范围，使用默认值"
            );
            Ok(default)
        }
    }

    // ===== 预测参数 =====

    /// 加载预测参数（覆写 ForecastConfig 默认值）
    ///
    /// 兜底置信度与最少观测数固定，不开放覆写。
    pub fn load_forecast_config(&self) -> Result<ForecastConfig, Box<dyn Error>> {
        let d = ForecastConfig::default();
        Ok(ForecastConfig {
            history_window_days: self.get_bounded_or(
                config_keys::HISTORY_WINDOW_DAYS,
                d.history_window_days,
                HISTORY_WINDOW_DAYS_RANGE,
            )?,
            ..d
        })
    }

    // ===== 同步参数 =====

    /// 加载同步参数（覆写 SyncConfig 默认值）
    pub fn load_sync_config(&self) -> Result<SyncConfig, Box<dyn Error>> {
        let d = SyncConfig::default();

        let interval_minutes = self.get_bounded_or(
            config_keys::SYNC_INTERVAL_MINUTES,
            d.sync_interval_secs / 60,
            SYNC_INTERVAL_MINUTES_RANGE,
        )?;

        Ok(SyncConfig {
            sync_interval_secs: interval_minutes * 60,
            failure_backoff_secs: self.get_bounded_or(
                config_keys::FAILURE_BACKOFF_SECS,
                d.failure_backoff_secs,
                FAILURE_BACKOFF_SECS_RANGE,
            )?,
            horizon_days: self.get_bounded_or(
                config_keys::HORIZON_DAYS,
                d.horizon_days,
                HORIZON_DAYS_RANGE,
            )?,
            forecast_retention_days: self.get_bounded_or(
                config_keys::FORECAST_RETENTION_DAYS,
                d.forecast_retention_days,
                RETENTION_DAYS_RANGE,
            )?,
            inventory_retention_days: self.get_bounded_or(
                config_keys::INVENTORY_RETENTION_DAYS,
                d.inventory_retention_days,
                RETENTION_DAYS_RANGE,
            )?,
            sync_log_retention_days: self.get_bounded_or(
                config_keys::SYNC_LOG_RETENTION_DAYS,
                d.sync_log_retention_days,
                RETENTION_DAYS_RANGE,
            )?,
            ..d
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 预测
    pub const HISTORY_WINDOW_DAYS: &str = "forecast_history_window_days";

    // 同步
    pub const SYNC_INTERVAL_MINUTES: &str = "sync_interval_minutes";
    pub const FAILURE_BACKOFF_SECS: &str = "sync_failure_backoff_secs";
    pub const HORIZON_DAYS: &str = "sync_horizon_days";

    // 数据保留
    pub const FORECAST_RETENTION_DAYS: &str = "retention_forecast_days";
    pub const INVENTORY_RETENTION_DAYS: &str = "retention_inventory_days";
    pub const SYNC_LOG_RETENTION_DAYS: &str = "retention_sync_log_days";
}
