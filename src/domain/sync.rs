// ==========================================
// 餐厅需求预测系统 - 同步领域模型
// ==========================================
// 职责: 同步周期结果、同步日志、运行状态快照
// 红线: SyncCycleResult 仅追加，不可修改
// ==========================================

use crate::domain::types::SyncRunStatus;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 单周期各步骤影响行数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncBreakdown {
    pub analytics: usize,
    pub predictions: usize,
    pub cleanup: usize,
}

impl SyncBreakdown {
    pub fn total(&self) -> usize {
        self.analytics + self.predictions + self.cleanup
    }
}

/// 数据保留截止日期（早于该日期的行被删除）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionCutoffs {
    pub forecasts: NaiveDate,
    pub inventory_transactions: NaiveDate,
    pub sync_logs: NaiveDate,
}

/// 数据保留清理删除行数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionReport {
    pub forecasts: usize,
    pub inventory_transactions: usize,
    pub sync_logs: usize,
}

impl RetentionReport {
    pub fn total(&self) -> usize {
        self.forecasts + self.inventory_transactions + self.sync_logs
    }
}

/// 同步周期结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncCycleResult {
    pub cycle_id: String,
    pub status: SyncRunStatus,
    pub records_affected: usize,
    pub breakdown: SyncBreakdown,
    pub error_message: Option<String>,
    pub duration_ms: i64,
    pub timestamp: DateTime<Local>,
}

/// 持久化的同步日志行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: i64,
    pub sync_type: String,
    pub status: SyncRunStatus,
    pub records_affected: i64,
    pub error_message: Option<String>,
    pub timestamp: NaiveDateTime,
}

/// 同步服务状态快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_running: bool,
    pub last_sync: Option<DateTime<Local>>,
    pub sync_interval_seconds: u64,
    pub recent_errors: Vec<String>,
    pub total_error_count: u64,
    pub last_result: Option<SyncCycleResult>,
}

impl SyncStatus {
    /// 间隔（分钟，向下取整）
    pub fn sync_interval_minutes(&self) -> u64 {
        self.sync_interval_seconds / 60
    }
}
