// ==========================================
// 餐厅需求预测系统 - 同步状态记录
// ==========================================
// 职责: 维护运行标志、最近同步时间、错误环形缓冲
// 约束: 最近错误只保留固定条数, 错误总数单调递增
// ==========================================

use crate::domain::sync::{SyncCycleResult, SyncStatus};
use chrono::{DateTime, Local};
use std::collections::VecDeque;

#[derive(Debug)]
pub struct StatusTracker {
    is_running: bool,
    last_sync: Option<DateTime<Local>>,
    sync_interval_secs: u64,
    recent_errors: VecDeque<String>,
    error_capacity: usize,
    total_error_count: u64,
    last_result: Option<SyncCycleResult>,
}

impl StatusTracker {
    pub fn new(sync_interval_secs: u64, error_capacity: usize) -> Self {
        Self {
            is_running: false,
            last_sync: None,
            sync_interval_secs,
            recent_errors: VecDeque::with_capacity(error_capacity),
            error_capacity: error_capacity.max(1),
            total_error_count: 0,
            last_result: None,
        }
    }

    pub fn set_running(&mut self, running: bool) {
        self.is_running = running;
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn set_interval_secs(&mut self, secs: u64) {
        self.sync_interval_secs = secs;
    }

    pub fn interval_secs(&self) -> u64 {
        self.sync_interval_secs
    }

    pub fn record_success(&mut self, result: SyncCycleResult) {
        self.last_sync = Some(result.timestamp);
        self.last_result = Some(result);
    }

    /// 记录失败周期, 超出容量时丢弃最旧错误
    pub fn record_failure(&mut self, result: SyncCycleResult, error_line: String) {
        if self.recent_errors.len() == self.error_capacity {
            self.recent_errors.pop_front();
        }
        self.recent_errors.push_back(error_line);
        self.total_error_count += 1;
        self.last_result = Some(result);
    }

    pub fn snapshot(&self) -> SyncStatus {
        SyncStatus {
            is_running: self.is_running,
            last_sync: self.last_sync,
            sync_interval_seconds: self.sync_interval_secs,
            recent_errors: self.recent_errors.iter().cloned().collect(),
            total_error_count: self.total_error_count,
            last_result: self.last_result.clone(),
        }
    }
}
