// ==========================================
// 餐厅需求预测系统 - 销售分析缓存仓储
// ==========================================
// 职责: sales_analytics 表（按 date + period 唯一）
// ==========================================

use crate::domain::sales::{DailySalesSummary, DaypartSales};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct SalesAnalyticsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SalesAnalyticsRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入/覆盖单日汇总（四行: morning/afternoon/evening/total）
    pub fn upsert_summary(&self, summary: &DailySalesSummary) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let date = summary.date.format("%Y-%m-%d").to_string();

        let rows: [(&str, &DaypartSales); 4] = [
            ("morning", &summary.morning),
            ("afternoon", &summary.afternoon),
            ("evening", &summary.evening),
            ("total", &summary.total),
        ];

        let mut count = 0;
        for (period, sales) in rows {
            count += tx.execute(
                r#"
                INSERT INTO sales_analytics (date, period, orders_count, revenue, avg_order_value)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(date, period) DO UPDATE SET
                    orders_count = excluded.orders_count,
                    revenue = excluded.revenue,
                    avg_order_value = excluded.avg_order_value,
                    created_at = datetime('now', 'localtime')
                "#,
                params![date, period, sales.orders, sales.revenue, sales.avg_order],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 读取已缓存的单日汇总
    pub fn find_summary(&self, date: NaiveDate) -> RepositoryResult<Option<DailySalesSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT period, orders_count, revenue
            FROM sales_analytics
            WHERE date = ?1 AND period IN ('morning', 'afternoon', 'evening')
            "#,
        )?;

        let rows = stmt.query_map(params![date.format("%Y-%m-%d").to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut found = false;
        let mut morning = DaypartSales::default();
        let mut afternoon = DaypartSales::default();
        let mut evening = DaypartSales::default();
        for row in rows {
            let (period, orders, revenue) = row?;
            found = true;
            let sales = DaypartSales::new(orders, revenue);
            match period.as_str() {
                "morning" => morning = sales,
                "afternoon" => afternoon = sales,
                _ => evening = sales,
            }
        }

        if !found {
            return Ok(None);
        }
        Ok(Some(DailySalesSummary::from_dayparts(
            date, morning, afternoon, evening,
        )))
    }
}
