// ==========================================
// 餐厅需求预测系统 - 后台同步编排器
// ==========================================
// 职责: 周期性执行 分析缓存 → 多日预测 → 数据保留清理
// 状态机: Stopped → Running → Stopped
// 取消: watch 通道, 仅在休眠与下一周期开始前生效
// 线程: 周期步骤 (SQLite + 建模) 在 spawn_blocking 线程执行
// 红线: 周期失败不终止循环; 失败后固定退避再重试
// ==========================================

use crate::config::SyncConfig;
use crate::domain::sync::{
    RetentionCutoffs, SyncBreakdown, SyncCycleResult, SyncLogEntry, SyncStatus,
};
use crate::domain::types::SyncRunStatus;
use crate::engine::DemandForecaster;
use crate::repository::error::RepositoryResult;
use crate::repository::store::DataStore;
use crate::sync::error::{SyncError, SyncResult};
use crate::sync::status::StatusTracker;
use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

// ==========================================
// LoopState - 后台循环生命周期
// ==========================================
enum LoopState {
    Stopped,
    Running {
        cancel_tx: watch::Sender<bool>,
        handle: JoinHandle<()>,
    },
}

// ==========================================
// SyncOrchestrator - 同步编排器
// ==========================================
pub struct SyncOrchestrator {
    inner: Arc<SyncCore>,
    state: AsyncMutex<LoopState>,
}

/// 循环任务与手动触发共享的部分
struct SyncCore {
    store: Arc<dyn DataStore>,
    forecaster: Arc<DemandForecaster>,
    config: SyncConfig,
    status: Mutex<StatusTracker>,
    // 串行化整个同步周期
    cycle_lock: AsyncMutex<()>,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn DataStore>,
        forecaster: Arc<DemandForecaster>,
        config: SyncConfig,
    ) -> Self {
        let status = StatusTracker::new(config.sync_interval_secs, config.recent_error_capacity);
        Self {
            inner: Arc::new(SyncCore {
                store,
                forecaster,
                config,
                status: Mutex::new(status),
                cycle_lock: AsyncMutex::new(()),
            }),
            state: AsyncMutex::new(LoopState::Stopped),
        }
    }

    // ==========================================
    // 生命周期
    // ==========================================

    /// 启动后台循环（已运行时仅告警）
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        if matches!(*state, LoopState::Running { .. }) {
            warn!("后台同步已在运行, 忽略重复启动");
            return;
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let core = self.inner.clone();
        let handle = tokio::spawn(core.run_loop(cancel_rx));

        self.inner.status().set_running(true);
        *state = LoopState::Running { cancel_tx, handle };
        info!(
            interval_secs = self.inner.status().interval_secs(),
            "后台同步已启动"
        );
    }

    /// 停止后台循环, 等待任务完全退出
    pub async fn stop(&self) -> SyncResult<()> {
        let mut state = self.state.lock().await;
        let previous = std::mem::replace(&mut *state, LoopState::Stopped);

        let LoopState::Running { cancel_tx, handle } = previous else {
            debug!("后台同步未运行, 忽略停止请求");
            return Ok(());
        };

        // 接收端已退出时发送失败可忽略
        let _ = cancel_tx.send(true);
        let joined = handle.await;
        self.inner.status().set_running(false);

        match joined {
            Ok(()) => {
                info!("后台同步已停止");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "后台同步任务异常退出");
                Err(SyncError::Worker(e.to_string()))
            }
        }
    }

    // ==========================================
    // 对外操作
    // ==========================================

    /// 立即执行一个同步周期（与后台周期互斥）
    pub async fn manual_sync(&self) -> SyncResult<SyncCycleResult> {
        self.inner.run_cycle().await
    }

    pub fn get_status(&self) -> SyncStatus {
        self.inner.status().snapshot()
    }

    /// 设置同步间隔（分钟）, 从下一次休眠开始生效
    pub fn set_sync_interval(&self, minutes: u64) -> SyncResult<()> {
        if minutes < 1 {
            return Err(SyncError::InvalidConfiguration(format!(
                "同步间隔必须至少 1 分钟, 实际为 {}",
                minutes
            )));
        }
        self.inner
            .status()
            .set_interval_secs(minutes.saturating_mul(60));
        info!(minutes, "同步间隔已更新");
        Ok(())
    }

    pub fn recent_sync_logs(&self, limit: usize) -> RepositoryResult<Vec<SyncLogEntry>> {
        self.inner.store.recent_sync_logs(limit)
    }
}

impl SyncCore {
    fn status(&self) -> MutexGuard<'_, StatusTracker> {
        match self.status.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn run_loop(self: Arc<Self>, mut cancel_rx: watch::Receiver<bool>) {
        info!("后台同步循环启动");

        loop {
            if *cancel_rx.borrow() {
                break;
            }

            let delay = match self.run_cycle().await {
                Ok(_) => Duration::from_secs(self.status().interval_secs()),
                Err(_) => Duration::from_secs(self.config.failure_backoff_secs),
            };
            debug!(delay_secs = delay.as_secs(), "等待下一同步周期");

            tokio::select! {
                _ = cancel_rx.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("后台同步循环退出");
    }

    #[instrument(skip(self))]
    async fn run_cycle(self: &Arc<Self>) -> SyncResult<SyncCycleResult> {
        let _cycle = self.cycle_lock.lock().await;

        let cycle_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let today = Local::now().date_naive();
        debug!(cycle_id = %cycle_id, today = %today, "同步周期开始");

        let core = Arc::clone(self);
        let span = Span::current();
        let outcome = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            core.execute_steps(today)
        })
        .await
        .unwrap_or_else(|e| Err(SyncError::Worker(e.to_string())));
        let duration_ms = started.elapsed().as_millis() as i64;

        match outcome {
            Ok(breakdown) => {
                let result = SyncCycleResult {
                    cycle_id,
                    status: SyncRunStatus::Success,
                    records_affected: breakdown.total(),
                    breakdown,
                    error_message: None,
                    duration_ms,
                    timestamp: Local::now(),
                };
                self.write_sync_log(SyncRunStatus::Success, result.records_affected, None);
                self.status().record_success(result.clone());
                info!(
                    cycle_id = %result.cycle_id,
                    records_affected = result.records_affected,
                    analytics = breakdown.analytics,
                    predictions = breakdown.predictions,
                    cleanup = breakdown.cleanup,
                    duration_ms,
                    "同步周期完成"
                );
                Ok(result)
            }
            Err(e) => {
                let message = e.to_string();
                let timestamp = Local::now();
                let result = SyncCycleResult {
                    cycle_id,
                    status: SyncRunStatus::Error,
                    records_affected: 0,
                    breakdown: SyncBreakdown::default(),
                    error_message: Some(message.clone()),
                    duration_ms,
                    timestamp,
                };
                self.write_sync_log(SyncRunStatus::Error, 0, Some(&message));
                self.status().record_failure(
                    result.clone(),
                    format!("{}: Sync failed: {}", timestamp.to_rfc3339(), message),
                );
                error!(cycle_id = %result.cycle_id, error = %message, "同步周期失败");
                Err(e)
            }
        }
    }

    fn execute_steps(&self, today: NaiveDate) -> SyncResult<SyncBreakdown> {
        Ok(SyncBreakdown {
            analytics: self.refresh_analytics(today)?,
            predictions: self.refresh_forecasts(today),
            cleanup: self.apply_retention(today)?,
        })
    }

    /// 步骤 a: 缓存昨日销售汇总
    fn refresh_analytics(&self, today: NaiveDate) -> SyncResult<usize> {
        let Some(yesterday) = today.pred_opt() else {
            return Ok(0);
        };
        let summary = self
            .store
            .read_daily_sales_summary(yesterday)
            .map_err(SyncError::Analytics)?;

        match summary {
            Some(summary) => {
                self.store
                    .cache_daily_sales_summary(&summary)
                    .map_err(SyncError::Analytics)?;
                debug!(date = %yesterday, orders = summary.total.orders, "昨日销售汇总已缓存");
                Ok(1)
            }
            None => Ok(0),
        }
    }

    /// 步骤 b: 未来若干天的预测, 单日失败仅记录
    fn refresh_forecasts(&self, today: NaiveDate) -> usize {
        let mut generated = 0;
        for offset in 1..=i64::from(self.config.horizon_days) {
            let Some(target) = today.checked_add_signed(ChronoDuration::days(offset)) else {
                warn!(offset, "目标日期超出可表示范围, 停止生成");
                break;
            };
            match self.forecaster.generate_for_horizon_as_of(target, today) {
                Ok(outcome) => generated += outcome.predictions_generated,
                Err(e) => warn!(target_date = %target, error = %e, "单日预测失败, 跳过"),
            }
        }
        generated
    }

    /// 步骤 c: 数据保留清理（单事务）
    fn apply_retention(&self, today: NaiveDate) -> SyncResult<usize> {
        let cutoffs = RetentionCutoffs {
            forecasts: days_before(today, self.config.forecast_retention_days)?,
            inventory_transactions: days_before(today, self.config.inventory_retention_days)?,
            sync_logs: days_before(today, self.config.sync_log_retention_days)?,
        };

        let report = self
            .store
            .purge_expired(&cutoffs)
            .map_err(SyncError::Retention)?;

        debug!(
            forecasts = report.forecasts,
            inventory = report.inventory_transactions,
            sync_logs = report.sync_logs,
            "数据保留清理完成"
        );
        Ok(report.total())
    }

    /// 写同步日志失败只记录, 不影响周期结果
    fn write_sync_log(&self, status: SyncRunStatus, records: usize, message: Option<&str>) {
        if let Err(e) =
            self.store
                .append_sync_log(&self.config.sync_type, status, records, message)
        {
            error!(error = %e, "同步日志写入失败");
        }
    }
}

fn days_before(today: NaiveDate, days: u32) -> SyncResult<NaiveDate> {
    today
        .checked_sub_signed(ChronoDuration::days(i64::from(days)))
        .ok_or_else(|| {
            SyncError::InvalidConfiguration(format!("保留天数超出日期范围: {}", days))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForecastConfig;
    use crate::repository::store::SqliteDataStore;

    fn orchestrator() -> SyncOrchestrator {
        let store: Arc<dyn DataStore> = Arc::new(SqliteDataStore::open_in_memory().unwrap());
        let forecaster = Arc::new(DemandForecaster::new(store.clone(), ForecastConfig::default()));
        SyncOrchestrator::new(store, forecaster, SyncConfig::default())
    }

    #[tokio::test]
    async fn test_manual_sync_on_empty_store() {
        let orch = orchestrator();
        let result = orch.manual_sync().await.unwrap();

        assert_eq!(result.status, SyncRunStatus::Success);
        assert_eq!(result.records_affected, 0);
        assert_eq!(result.breakdown, SyncBreakdown::default());

        let status = orch.get_status();
        assert!(!status.is_running);
        assert!(status.last_sync.is_some());

        let logs = orch.recent_sync_logs(5).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].sync_type, "auto_sync");
        assert_eq!(logs[0].status, SyncRunStatus::Success);
    }

    #[tokio::test]
    async fn test_set_sync_interval_validation() {
        let orch = orchestrator();
        assert!(matches!(
            orch.set_sync_interval(0),
            Err(SyncError::InvalidConfiguration(_))
        ));
        assert_eq!(orch.get_status().sync_interval_seconds, 3600);

        orch.set_sync_interval(15).unwrap();
        assert_eq!(orch.get_status().sync_interval_seconds, 900);
    }

    #[test]
    fn test_days_before_rejects_overflow() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert_eq!(
            days_before(today, 30).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 20).unwrap()
        );
        assert!(matches!(
            days_before(today, u32::MAX),
            Err(SyncError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_start_twice_and_stop_twice() {
        let orch = orchestrator();
        orch.start().await;
        orch.start().await;
        assert!(orch.get_status().is_running);

        orch.stop().await.unwrap();
        assert!(!orch.get_status().is_running);
        orch.stop().await.unwrap();
    }
}
