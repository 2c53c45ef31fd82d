// ==========================================
// 餐厅需求预测系统 - 预测结果仓储
// ==========================================
// 职责: predictions 表读写
// 红线: 按 (dish_id, prediction_date, period) 覆盖写入，不保留被替换的历史
// 约束: 批量写入在单个事务内完成
// ==========================================

use crate::domain::forecast::Forecast;
use crate::domain::types::{Daypart, ForecastSource};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct ForecastRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ForecastRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 批量覆盖写入预测结果
    ///
    /// # 返回
    /// - Ok(count): 写入行数
    pub fn upsert_batch(&self, forecasts: &[Forecast]) -> RepositoryResult<usize> {
        if forecasts.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for forecast in forecasts {
            let factors_json = serde_json::to_string(&forecast.factors)?;
            tx.execute(
                r#"
                INSERT INTO predictions (
                    dish_id, dish_name, prediction_date, period,
                    predicted_demand, confidence, recommended_prep,
                    factors, source, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(dish_id, prediction_date, period) DO UPDATE SET
                    dish_name = excluded.dish_name,
                    predicted_demand = excluded.predicted_demand,
                    confidence = excluded.confidence,
                    recommended_prep = excluded.recommended_prep,
                    factors = excluded.factors,
                    source = excluded.source,
                    created_at = excluded.created_at
                "#,
                params![
                    forecast.dish_id,
                    forecast.dish_name,
                    forecast.target_date.format("%Y-%m-%d").to_string(),
                    forecast.daypart.to_db_str(),
                    forecast.predicted_demand,
                    forecast.confidence,
                    forecast.recommended_prep,
                    factors_json,
                    forecast.source.to_db_str(),
                    forecast.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                ],
            )?;
            count += 1;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 删除目标日期早于 cutoff 的预测
    pub fn delete_older_than(&self, cutoff: NaiveDate) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(Self::delete_older_than_on(&conn, cutoff)?)
    }

    /// 在调用方持有的连接（或事务）上执行删除
    pub(crate) fn delete_older_than_on(
        conn: &Connection,
        cutoff: NaiveDate,
    ) -> rusqlite::Result<usize> {
        conn.execute(
            "DELETE FROM predictions WHERE prediction_date < ?1",
            params![cutoff.format("%Y-%m-%d").to_string()],
        )
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询某日的全部预测（按菜品、时段排序）
    pub fn find_by_date(&self, date: NaiveDate) -> RepositoryResult<Vec<Forecast>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                dish_id, dish_name, prediction_date, period,
                predicted_demand, confidence, recommended_prep,
                factors, source, created_at
            FROM predictions
            WHERE prediction_date = ?1
            ORDER BY dish_id,
                CASE period WHEN 'morning' THEN 0 WHEN 'afternoon' THEN 1 ELSE 2 END
            "#,
        )?;

        let rows = stmt.query_map(params![date.format("%Y-%m-%d").to_string()], |row| {
            map_forecast_row(row)
        })?;

        let mut forecasts = Vec::new();
        for row in rows {
            forecasts.push(row?);
        }
        Ok(forecasts)
    }

    /// 统计预测总行数
    pub fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn map_forecast_row(row: &Row) -> rusqlite::Result<Forecast> {
    let period: String = row.get(3)?;
    let daypart = Daypart::from_str(&period).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("未知时段: {}", period).into(),
        )
    })?;

    // factors 损坏时按空列表处理，不阻断整批读取
    let factors_json: String = row.get(7)?;
    let factors: Vec<String> = serde_json::from_str(&factors_json).unwrap_or_else(|e| {
        tracing::warn!(error = %e, raw = %factors_json, "预测因子 JSON 解析失败");
        Vec::new()
    });

    let source: String = row.get(8)?;

    Ok(Forecast {
        dish_id: row.get(0)?,
        dish_name: row.get(1)?,
        target_date: row.get::<_, NaiveDate>(2)?,
        daypart,
        predicted_demand: row.get(4)?,
        confidence: row.get(5)?,
        recommended_prep: row.get(6)?,
        factors,
        source: ForecastSource::from_str(&source),
        created_at: row.get(9)?,
    })
}
