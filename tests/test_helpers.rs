// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、订单/预测/库存流水种子数据、故障注入仓储
// ==========================================

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use restaurant_forecast::domain::{
    CompletedOrderLine, DailySalesSummary, Daypart, Forecast, ForecastSource, RetentionCutoffs,
    RetentionReport, SyncLogEntry, SyncRunStatus,
};
use restaurant_forecast::repository::{DataStore, RepositoryError, RepositoryResult};
use restaurant_forecast::SqliteDataStore;
use rusqlite::params;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - SqliteDataStore: 已建表的数据仓储
pub fn create_test_store() -> Result<(NamedTempFile, SqliteDataStore), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是有效 UTF-8")?
        .to_string();

    let store = SqliteDataStore::open(&db_path)?;
    Ok((temp_file, store))
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// 插入菜品（已存在则忽略）
pub fn seed_dish(store: &SqliteDataStore, dish_id: &str, name: &str) {
    let conn = store.connection();
    let c = conn.lock().unwrap();
    c.execute(
        "INSERT OR IGNORE INTO dishes (id, name, price, category) VALUES (?1, ?2, 12.5, 'Main')",
        params![dish_id, name],
    )
    .unwrap();
}

/// 插入一张单品订单
pub fn seed_order(
    store: &SqliteDataStore,
    order_id: &str,
    timestamp: &str,
    status: &str,
    dish_id: &str,
    quantity: i64,
) {
    let conn = store.connection();
    let c = conn.lock().unwrap();
    c.execute(
        "INSERT INTO orders (id, total, subtotal, tax, timestamp, status) VALUES (?1, ?2, ?3, 1.0, ?4, ?5)",
        params![order_id, 12.5 * quantity as f64 + 1.0, 12.5 * quantity as f64, timestamp, status],
    )
    .unwrap();
    c.execute(
        "INSERT INTO order_items (order_id, dish_id, quantity, price) VALUES (?1, ?2, ?3, 12.5)",
        params![order_id, dish_id, quantity],
    )
    .unwrap();
}

/// 从 start 起每天一张已完成订单, 下单时刻为 time (HH:MM:SS)
pub fn seed_daily_series(
    store: &SqliteDataStore,
    dish_id: &str,
    start: NaiveDate,
    time: &str,
    quantities: &[i64],
) {
    seed_dish(store, dish_id, &format!("Dish {}", dish_id));
    for (i, qty) in quantities.iter().enumerate() {
        let day = start + Duration::days(i as i64);
        let order_id = format!("{}-{}-{}", dish_id, day, time);
        seed_order(
            store,
            &order_id,
            &format!("{} {}", day.format("%Y-%m-%d"), time),
            "completed",
            dish_id,
            *qty,
        );
    }
}

/// 构造一条预测（用于直接写库）
pub fn make_forecast(dish_id: &str, target_date: NaiveDate, daypart: Daypart) -> Forecast {
    Forecast {
        dish_id: dish_id.to_string(),
        dish_name: format!("Dish {}", dish_id),
        daypart,
        target_date,
        predicted_demand: 3,
        confidence: 60.0,
        recommended_prep: 4,
        factors: vec!["Limited historical data".to_string()],
        source: ForecastSource::Fallback,
        created_at: target_date.and_hms_opt(0, 0, 0).unwrap(),
    }
}

/// 插入库存流水
pub fn seed_inventory_txn(store: &SqliteDataStore, timestamp: &str) {
    let conn = store.connection();
    let c = conn.lock().unwrap();
    c.execute(
        "INSERT INTO inventory_transactions (ingredient_id, transaction_type, quantity_change, timestamp)
         VALUES ('ing-1', 'usage', -1.5, ?1)",
        params![timestamp],
    )
    .unwrap();
}

/// 插入指定时间的同步日志
pub fn seed_sync_log(store: &SqliteDataStore, timestamp: &str) {
    let conn = store.connection();
    let c = conn.lock().unwrap();
    c.execute(
        "INSERT INTO sync_log (sync_type, status, records_affected, timestamp) VALUES ('auto_sync', 'success', 0, ?1)",
        params![timestamp],
    )
    .unwrap();
}

pub fn count_rows(store: &SqliteDataStore, table: &str) -> i64 {
    let conn = store.connection();
    let c = conn.lock().unwrap();
    c.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}

// ==========================================
// FlakyStore - 故障注入仓储
// ==========================================
// 前 N 次保留清理失败（或 panic）; 统计清理尝试次数
pub struct FlakyStore {
    inner: SqliteDataStore,
    retention_failures_left: AtomicUsize,
    retention_panics_left: AtomicUsize,
    retention_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: SqliteDataStore, retention_failures: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            retention_failures_left: AtomicUsize::new(retention_failures),
            retention_panics_left: AtomicUsize::new(0),
            retention_attempts: AtomicUsize::new(0),
        })
    }

    /// 前 N 次保留清理直接 panic
    pub fn panicking(inner: SqliteDataStore, retention_panics: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            retention_failures_left: AtomicUsize::new(0),
            retention_panics_left: AtomicUsize::new(retention_panics),
            retention_attempts: AtomicUsize::new(0),
        })
    }

    pub fn inner(&self) -> &SqliteDataStore {
        &self.inner
    }

    /// 已发生的同步周期清理尝试次数
    pub fn retention_attempts(&self) -> usize {
        self.retention_attempts.load(Ordering::SeqCst)
    }
}

impl DataStore for FlakyStore {
    fn load_completed_orders(
        &self,
        as_of: NaiveDate,
        window_days: u32,
    ) -> RepositoryResult<Vec<CompletedOrderLine>> {
        self.inner.load_completed_orders(as_of, window_days)
    }

    fn upsert_forecasts(&self, forecasts: &[Forecast]) -> RepositoryResult<usize> {
        self.inner.upsert_forecasts(forecasts)
    }

    fn read_forecasts(&self, date: NaiveDate) -> RepositoryResult<Vec<Forecast>> {
        self.inner.read_forecasts(date)
    }

    fn read_daily_sales_summary(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DailySalesSummary>> {
        self.inner.read_daily_sales_summary(date)
    }

    fn cache_daily_sales_summary(&self, summary: &DailySalesSummary) -> RepositoryResult<()> {
        self.inner.cache_daily_sales_summary(summary)
    }

    fn delete_forecasts_older_than(&self, date: NaiveDate) -> RepositoryResult<usize> {
        self.inner.delete_forecasts_older_than(date)
    }

    fn delete_inventory_transactions_older_than(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<usize> {
        self.inner.delete_inventory_transactions_older_than(date)
    }

    fn delete_sync_log_older_than(&self, date: NaiveDate) -> RepositoryResult<usize> {
        self.inner.delete_sync_log_older_than(date)
    }

    fn purge_expired(&self, cutoffs: &RetentionCutoffs) -> RepositoryResult<RetentionReport> {
        self.retention_attempts.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.retention_panics_left) {
            panic!("injected panic during retention");
        }
        if take_one(&self.retention_failures_left) {
            return Err(RepositoryError::DatabaseTransactionError(
                "injected failure".to_string(),
            ));
        }
        self.inner.purge_expired(cutoffs)
    }

    fn append_sync_log(
        &self,
        sync_type: &str,
        status: SyncRunStatus,
        records_affected: usize,
        error_message: Option<&str>,
    ) -> RepositoryResult<()> {
        self.inner
            .append_sync_log(sync_type, status, records_affected, error_message)
    }

    fn recent_sync_logs(&self, limit: usize) -> RepositoryResult<Vec<SyncLogEntry>> {
        self.inner.recent_sync_logs(limit)
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
