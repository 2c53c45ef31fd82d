// ==========================================
// 餐厅需求预测系统 - 运行参数
// ==========================================
// 职责: 预测引擎与同步编排器的参数及默认值
// ==========================================

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

// ==========================================
// 可覆写参数的取值范围
// ==========================================
pub const HISTORY_WINDOW_DAYS_RANGE: RangeInclusive<u32> = 1..=3650;
pub const SYNC_INTERVAL_MINUTES_RANGE: RangeInclusive<u64> = 1..=7 * 24 * 60;
pub const FAILURE_BACKOFF_SECS_RANGE: RangeInclusive<u64> = 1..=24 * 3600;
pub const HORIZON_DAYS_RANGE: RangeInclusive<u32> = 1..=30;
pub const RETENTION_DAYS_RANGE: RangeInclusive<u32> = 1..=3650;

// ==========================================
// ForecastConfig - 预测参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// 历史窗口（天）
    pub history_window_days: u32,
    /// 回归建模所需最少观测数，不足则走兜底
    pub min_observations: usize,
    /// 兜底置信度（固定值）
    pub fallback_confidence: f64,
    /// 无任何观测时的兜底需求
    pub fallback_default_demand: f64,
    /// 兜底备餐系数
    pub fallback_prep_multiplier: f64,
    /// 置信度上下限
    pub min_confidence: f64,
    pub max_confidence: f64,
    /// 高置信阈值（高于此值使用较低的安全系数）
    pub high_confidence_threshold: f64,
    pub high_confidence_multiplier: f64,
    pub low_confidence_multiplier: f64,
    /// 因子最多条数
    pub max_factors: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            history_window_days: 60,
            min_observations: 5,
            fallback_confidence: 60.0,
            fallback_default_demand: 5.0,
            fallback_prep_multiplier: 1.2,
            min_confidence: 50.0,
            max_confidence: 95.0,
            high_confidence_threshold: 80.0,
            high_confidence_multiplier: 1.2,
            low_confidence_multiplier: 1.3,
            max_factors: 4,
        }
    }
}

// ==========================================
// SyncConfig - 同步编排参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// 正常同步间隔（秒）
    pub sync_interval_secs: u64,
    /// 周期失败后的退避间隔（秒）
    pub failure_backoff_secs: u64,
    /// 预测覆盖天数（今天 +1 … +N）
    pub horizon_days: u32,
    /// 预测保留天数
    pub forecast_retention_days: u32,
    /// 库存流水保留天数
    pub inventory_retention_days: u32,
    /// 同步日志保留天数
    pub sync_log_retention_days: u32,
    /// 内存中保留的最近错误条数
    pub recent_error_capacity: usize,
    /// 同步日志类型
    pub sync_type: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval_secs: 3600,
            failure_backoff_secs: 60,
            horizon_days: 3,
            forecast_retention_days: 30,
            inventory_retention_days: 90,
            sync_log_retention_days: 30,
            recent_error_capacity: 5,
            sync_type: "auto_sync".to_string(),
        }
    }
}
