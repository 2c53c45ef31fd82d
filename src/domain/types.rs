// ==========================================
// 餐厅需求预测系统 - 领域类型定义
// ==========================================
// 职责: 时段、预测来源、同步状态等枚举
// 序列化格式: lowercase (与数据库一致)
// ==========================================

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 营业时段 (Daypart)
// ==========================================
// 按下单时刻的小时分桶:
// 6-11 → morning, 12-17 → afternoon, 18-23 → evening, 其余不计入
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Daypart {
    Morning,   // 早市
    Afternoon, // 午市
    Evening,   // 晚市
}

impl Daypart {
    /// 全部时段（固定顺序）
    pub const ALL: [Daypart; 3] = [Daypart::Morning, Daypart::Afternoon, Daypart::Evening];

    /// 按小时分桶，营业时段外返回 None
    pub fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            6..=11 => Some(Daypart::Morning),
            12..=17 => Some(Daypart::Afternoon),
            18..=23 => Some(Daypart::Evening),
            _ => None,
        }
    }

    /// 从字符串解析时段
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "morning" => Some(Daypart::Morning),
            "afternoon" => Some(Daypart::Afternoon),
            "evening" => Some(Daypart::Evening),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Daypart::Morning => "morning",
            Daypart::Afternoon => "afternoon",
            Daypart::Evening => "evening",
        }
    }
}

impl fmt::Display for Daypart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 预测来源 (Forecast Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastSource {
    Model,    // 回归模型拟合
    Fallback, // 数据不足，历史均值兜底
}

impl ForecastSource {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fallback" => ForecastSource::Fallback,
            _ => ForecastSource::Model,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ForecastSource::Model => "model",
            ForecastSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ForecastSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 同步执行状态 (Sync Run Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncRunStatus {
    Success,
    Error,
}

impl SyncRunStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "success" => SyncRunStatus::Success,
            _ => SyncRunStatus::Error,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SyncRunStatus::Success => "success",
            SyncRunStatus::Error => "error",
        }
    }
}

impl fmt::Display for SyncRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 日历辅助
// ==========================================

/// 是否周末（周六/周日）
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// 星期英文全称（用于预测因子文案）
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
