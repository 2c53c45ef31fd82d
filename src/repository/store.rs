// ==========================================
// 餐厅需求预测系统 - 数据仓储契约
// ==========================================
// 职责: 定义预测/同步子系统消费的数据访问接口，并提供 SQLite 实现
// 目标: 引擎与编排器只依赖 trait，便于测试中注入故障
// ==========================================

use crate::db::{ensure_schema, open_in_memory_connection, open_sqlite_connection};
use crate::domain::forecast::{CompletedOrderLine, Forecast};
use crate::domain::sales::DailySalesSummary;
use crate::domain::sync::{RetentionCutoffs, RetentionReport, SyncLogEntry};
use crate::domain::types::SyncRunStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{
    ForecastRepository, InventoryTransactionRepository, OrderHistoryRepository,
    SalesAnalyticsRepository, SyncLogRepository,
};
use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// DataStore - 数据仓储契约
// ==========================================
pub trait DataStore: Send + Sync {
    /// 已完成订单明细，窗口为 [as_of - window_days, as_of]
    fn load_completed_orders(
        &self,
        as_of: NaiveDate,
        window_days: u32,
    ) -> RepositoryResult<Vec<CompletedOrderLine>>;

    /// 按 (dish_id, target_date, daypart) 覆盖写入
    fn upsert_forecasts(&self, forecasts: &[Forecast]) -> RepositoryResult<usize>;

    fn read_forecasts(&self, date: NaiveDate) -> RepositoryResult<Vec<Forecast>>;

    fn read_daily_sales_summary(&self, date: NaiveDate)
        -> RepositoryResult<Option<DailySalesSummary>>;

    /// 物化单日销售汇总到分析缓存
    fn cache_daily_sales_summary(&self, summary: &DailySalesSummary) -> RepositoryResult<()>;

    fn delete_forecasts_older_than(&self, date: NaiveDate) -> RepositoryResult<usize>;

    fn delete_inventory_transactions_older_than(&self, date: NaiveDate)
        -> RepositoryResult<usize>;

    fn delete_sync_log_older_than(&self, date: NaiveDate) -> RepositoryResult<usize>;

    /// 三类保留期清理，全部成功或全部回滚
    fn purge_expired(&self, cutoffs: &RetentionCutoffs) -> RepositoryResult<RetentionReport>;

    fn append_sync_log(
        &self,
        sync_type: &str,
        status: SyncRunStatus,
        records_affected: usize,
        error_message: Option<&str>,
    ) -> RepositoryResult<()>;

    fn recent_sync_logs(&self, limit: usize) -> RepositoryResult<Vec<SyncLogEntry>>;
}

// ==========================================
// SqliteDataStore - SQLite 实现
// ==========================================
// 聚合各表仓储，共享同一个连接
#[derive(Clone)]
pub struct SqliteDataStore {
    conn: Arc<Mutex<Connection>>,
    pub order_history_repo: Arc<OrderHistoryRepository>,
    pub forecast_repo: Arc<ForecastRepository>,
    pub sales_analytics_repo: Arc<SalesAnalyticsRepository>,
    pub inventory_txn_repo: Arc<InventoryTransactionRepository>,
    pub sync_log_repo: Arc<SyncLogRepository>,
}

impl SqliteDataStore {
    /// 基于已有连接创建（会执行幂等建表）
    pub fn new(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            ensure_schema(&guard)?;
        }

        Ok(Self {
            order_history_repo: Arc::new(OrderHistoryRepository::new(conn.clone())),
            forecast_repo: Arc::new(ForecastRepository::new(conn.clone())),
            sales_analytics_repo: Arc::new(SalesAnalyticsRepository::new(conn.clone())),
            inventory_txn_repo: Arc::new(InventoryTransactionRepository::new(conn.clone())),
            sync_log_repo: Arc::new(SyncLogRepository::new(conn.clone())),
            conn,
        })
    }

    /// 打开数据库文件
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::new(Arc::new(Mutex::new(conn)))
    }

    /// 打开内存库
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = open_in_memory_connection()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::new(Arc::new(Mutex::new(conn)))
    }

    /// 共享连接（供配置管理器等复用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

impl DataStore for SqliteDataStore {
    fn load_completed_orders(
        &self,
        as_of: NaiveDate,
        window_days: u32,
    ) -> RepositoryResult<Vec<CompletedOrderLine>> {
        // 窗口越过日期下界时取全部历史
        let since = as_of
            .checked_sub_signed(Duration::days(i64::from(window_days)))
            .unwrap_or(NaiveDate::MIN);
        self.order_history_repo.list_completed_lines(since, as_of)
    }

    fn upsert_forecasts(&self, forecasts: &[Forecast]) -> RepositoryResult<usize> {
        self.forecast_repo.upsert_batch(forecasts)
    }

    fn read_forecasts(&self, date: NaiveDate) -> RepositoryResult<Vec<Forecast>> {
        self.forecast_repo.find_by_date(date)
    }

    fn read_daily_sales_summary(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DailySalesSummary>> {
        self.order_history_repo.daily_sales_summary(date)
    }

    fn cache_daily_sales_summary(&self, summary: &DailySalesSummary) -> RepositoryResult<()> {
        self.sales_analytics_repo.upsert_summary(summary)?;
        Ok(())
    }

    fn delete_forecasts_older_than(&self, date: NaiveDate) -> RepositoryResult<usize> {
        self.forecast_repo.delete_older_than(date)
    }

    fn delete_inventory_transactions_older_than(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<usize> {
        self.inventory_txn_repo.delete_older_than(date)
    }

    fn delete_sync_log_older_than(&self, date: NaiveDate) -> RepositoryResult<usize> {
        self.sync_log_repo.delete_older_than(date)
    }

    fn purge_expired(&self, cutoffs: &RetentionCutoffs) -> RepositoryResult<RetentionReport> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn.transaction()?;

        let report = RetentionReport {
            forecasts: ForecastRepository::delete_older_than_on(&tx, cutoffs.forecasts)?,
            inventory_transactions: InventoryTransactionRepository::delete_older_than_on(
                &tx,
                cutoffs.inventory_transactions,
            )?,
            sync_logs: SyncLogRepository::delete_older_than_on(&tx, cutoffs.sync_logs)?,
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(report)
    }

    fn append_sync_log(
        &self,
        sync_type: &str,
        status: SyncRunStatus,
        records_affected: usize,
        error_message: Option<&str>,
    ) -> RepositoryResult<()> {
        self.sync_log_repo
            .append(sync_type, status, records_affected, error_message)?;
        Ok(())
    }

    fn recent_sync_logs(&self, limit: usize) -> RepositoryResult<Vec<SyncLogEntry>> {
        self.sync_log_repo.list_recent(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Daypart, ForecastSource};
    use chrono::NaiveDateTime;

    fn seed_order(store: &SqliteDataStore, order_id: &str, ts: &str, status: &str, dish: &str, qty: i64) {
        let conn = store.connection();
        let c = conn.lock().unwrap();
        c.execute(
            "INSERT OR IGNORE INTO dishes (id, name, price, category) VALUES (?1, ?2, 10.0, 'Main')",
            rusqlite::params![dish, format!("Dish {}", dish)],
        )
        .unwrap();
        c.execute(
            "INSERT INTO orders (id, total, subtotal, tax, timestamp, status) VALUES (?1, 12.0, 11.0, 1.0, ?2, ?3)",
            rusqlite::params![order_id, ts, status],
        )
        .unwrap();
        c.execute(
            "INSERT INTO order_items (order_id, dish_id, quantity, price) VALUES (?1, ?2, ?3, 10.0)",
            rusqlite::params![order_id, dish, qty],
        )
        .unwrap();
    }

    fn forecast(dish: &str, date: NaiveDate, daypart: Daypart, demand: i64) -> Forecast {
        Forecast {
            dish_id: dish.to_string(),
            dish_name: format!("Dish {}", dish),
            daypart,
            target_date: date,
            predicted_demand: demand,
            confidence: 60.0,
            recommended_prep: demand + 1,
            factors: vec!["Limited historical data".to_string()],
            source: ForecastSource::Fallback,
            created_at: NaiveDateTime::parse_from_str("2024-05-01 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
        }
    }

    #[test]
    fn test_load_completed_orders_filters_status_and_window() {
        let store = SqliteDataStore::open_in_memory().unwrap();
        seed_order(&store, "o1", "2024-05-10 08:30:00", "completed", "d1", 2);
        seed_order(&store, "o2", "2024-05-10 13:00:00", "pending", "d1", 5);
        seed_order(&store, "o3", "2024-03-01 19:00:00", "completed", "d1", 7);
        seed_order(&store, "o4", "2024-05-12 19:00:00", "completed", "d1", 1);

        let as_of = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap();
        let lines = store.load_completed_orders(as_of, 60).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].dish_id, "d1");
        assert_eq!(lines[0].dish_name, "Dish d1");
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn test_upsert_replaces_by_key() {
        let store = SqliteDataStore::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        store
            .upsert_forecasts(&[forecast("d1", date, Daypart::Morning, 3)])
            .unwrap();
        store
            .upsert_forecasts(&[forecast("d1", date, Daypart::Morning, 8)])
            .unwrap();

        let rows = store.read_forecasts(date).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].predicted_demand, 8);
        assert_eq!(rows[0].factors, vec!["Limited historical data".to_string()]);
        assert_eq!(rows[0].source, ForecastSource::Fallback);
        assert_eq!(store.forecast_repo.count_all().unwrap(), 1);
    }

    #[test]
    fn test_daily_sales_summary_absent_without_orders() {
        let store = SqliteDataStore::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert!(store.read_daily_sales_summary(date).unwrap().is_none());

        seed_order(&store, "o1", "2024-05-10 08:30:00", "completed", "d1", 2);
        seed_order(&store, "o2", "2024-05-10 19:30:00", "completed", "d1", 1);

        let summary = store.read_daily_sales_summary(date).unwrap().unwrap();
        assert_eq!(summary.morning.orders, 1);
        assert_eq!(summary.evening.orders, 1);
        assert_eq!(summary.total.orders, 2);
        assert!((summary.total.revenue - 24.0).abs() < 1e-9);

        store.cache_daily_sales_summary(&summary).unwrap();
        let cached = store.sales_analytics_repo.find_summary(date).unwrap().unwrap();
        assert_eq!(cached, summary);
    }

    fn count(store: &SqliteDataStore, table: &str) -> i64 {
        let conn = store.connection();
        let c = conn.lock().unwrap();
        c.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    fn cutoffs(date: NaiveDate) -> RetentionCutoffs {
        RetentionCutoffs {
            forecasts: date,
            inventory_transactions: date,
            sync_logs: date,
        }
    }

    #[test]
    fn test_window_beyond_date_range_reads_all_history() {
        let store = SqliteDataStore::open_in_memory().unwrap();
        seed_order(&store, "o1", "2020-01-10 08:30:00", "completed", "d1", 2);

        let as_of = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap();
        let lines = store.load_completed_orders(as_of, u32::MAX).unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_purge_expired_reports_each_table() {
        let store = SqliteDataStore::open_in_memory().unwrap();
        let old = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let recent = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        store
            .upsert_forecasts(&[
                forecast("d1", old, Daypart::Morning, 3),
                forecast("d1", recent, Daypart::Morning, 3),
            ])
            .unwrap();
        {
            let conn = store.connection();
            let c = conn.lock().unwrap();
            c.execute(
                "INSERT INTO inventory_transactions (ingredient_id, transaction_type, quantity_change, timestamp)
                 VALUES ('ing-1', 'usage', -1.0, '2024-01-01 09:00:00')",
                [],
            )
            .unwrap();
        }

        let report = store
            .purge_expired(&cutoffs(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
            .unwrap();
        assert_eq!(report.forecasts, 1);
        assert_eq!(report.inventory_transactions, 1);
        assert_eq!(report.sync_logs, 0);
        assert_eq!(report.total(), 2);
        assert_eq!(count(&store, "predictions"), 1);
    }

    #[test]
    fn test_purge_expired_rolls_back_on_failure() {
        let store = SqliteDataStore::open_in_memory().unwrap();
        let old = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        store
            .upsert_forecasts(&[forecast("d1", old, Daypart::Evening, 3)])
            .unwrap();
        // 最后一步删除失败
        {
            let conn = store.connection();
            let c = conn.lock().unwrap();
            c.execute("DROP TABLE sync_log", []).unwrap();
        }

        let result = store.purge_expired(&cutoffs(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(result.is_err());
        assert_eq!(count(&store, "predictions"), 1);
    }

    #[test]
    fn test_sync_log_append_and_recent() {
        let store = SqliteDataStore::open_in_memory().unwrap();
        store
            .append_sync_log("auto_sync", SyncRunStatus::Success, 4, None)
            .unwrap();
        store
            .append_sync_log("auto_sync", SyncRunStatus::Error, 0, Some("boom"))
            .unwrap();

        let logs = store.recent_sync_logs(10).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].status, SyncRunStatus::Error);
        assert_eq!(logs[0].error_message.as_deref(), Some("boom"));
        assert_eq!(logs[1].records_affected, 4);
    }
}
