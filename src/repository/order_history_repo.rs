// ==========================================
// 餐厅需求预测系统 - 订单历史仓储
// ==========================================
// 职责: 读取已完成订单明细（只读）
// 红线: Repository 不做业务逻辑,时段分桶与聚合由 HistoricalDataset 负责
// ==========================================

use crate::domain::forecast::CompletedOrderLine;
use crate::domain::sales::{DailySalesSummary, DaypartSales};
use crate::domain::types::Daypart;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct OrderHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderHistoryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 [since, until] 区间内已完成订单的明细行
    ///
    /// 按下单时间升序返回；菜品名称取自 dishes 表（含已停售菜品）。
    pub fn list_completed_lines(
        &self,
        since: NaiveDate,
        until: NaiveDate,
    ) -> RepositoryResult<Vec<CompletedOrderLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                o.timestamp,
                oi.dish_id,
                d.name,
                oi.quantity
            FROM orders o
            JOIN order_items oi ON o.id = oi.order_id
            JOIN dishes d ON oi.dish_id = d.id
            WHERE o.status = 'completed'
              AND DATE(o.timestamp) >= ?1
              AND DATE(o.timestamp) <= ?2
            ORDER BY o.timestamp, oi.dish_id
            "#,
        )?;

        let rows = stmt.query_map(
            params![
                since.format("%Y-%m-%d").to_string(),
                until.format("%Y-%m-%d").to_string()
            ],
            |row| {
                Ok(CompletedOrderLine {
                    ordered_at: row.get(0)?,
                    dish_id: row.get(1)?,
                    dish_name: row.get(2)?,
                    quantity: row.get(3)?,
                })
            },
        )?;

        let mut lines = Vec::new();
        for row in rows {
            lines.push(row?);
        }
        Ok(lines)
    }

    /// 计算单日分时段销售汇总
    ///
    /// 当天没有已完成订单时返回 None。
    pub fn daily_sales_summary(&self, date: NaiveDate) -> RepositoryResult<Option<DailySalesSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                CASE
                    WHEN CAST(strftime('%H', timestamp) AS INTEGER) BETWEEN 6 AND 11 THEN 'morning'
                    WHEN CAST(strftime('%H', timestamp) AS INTEGER) BETWEEN 12 AND 17 THEN 'afternoon'
                    WHEN CAST(strftime('%H', timestamp) AS INTEGER) BETWEEN 18 AND 23 THEN 'evening'
                    ELSE 'other'
                END AS period,
                COUNT(*) AS orders_count,
                COALESCE(SUM(total), 0) AS revenue
            FROM orders
            WHERE DATE(timestamp) = ?1 AND status = 'completed'
            GROUP BY period
            "#,
        )?;

        let rows = stmt.query_map(params![date.format("%Y-%m-%d").to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut any_row = false;
        let mut morning = DaypartSales::default();
        let mut afternoon = DaypartSales::default();
        let mut evening = DaypartSales::default();

        for row in rows {
            let (period, orders, revenue) = row?;
            any_row = true;
            match Daypart::from_str(&period) {
                Some(Daypart::Morning) => morning = DaypartSales::new(orders, revenue),
                Some(Daypart::Afternoon) => afternoon = DaypartSales::new(orders, revenue),
                Some(Daypart::Evening) => evening = DaypartSales::new(orders, revenue),
                // 营业时段外的订单只用于判断“当天有数据”
                None => {}
            }
        }

        if !any_row {
            return Ok(None);
        }

        Ok(Some(DailySalesSummary::from_dayparts(
            date, morning, afternoon, evening,
        )))
    }
}
