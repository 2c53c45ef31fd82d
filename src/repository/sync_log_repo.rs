// ==========================================
// 餐厅需求预测系统 - 同步日志仓储
// ==========================================
// 职责: sync_log 表（仅追加 + 保留期清理）
// ==========================================

use crate::domain::sync::SyncLogEntry;
use crate::domain::types::SyncRunStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct SyncLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SyncLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加一条同步日志
    ///
    /// # 返回
    /// - Ok(id): 新行 ID
    pub fn append(
        &self,
        sync_type: &str,
        status: SyncRunStatus,
        records_affected: usize,
        error_message: Option<&str>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sync_log (sync_type, status, records_affected, error_message, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                sync_type,
                status.to_db_str(),
                records_affected as i64,
                error_message,
                Local::now()
                    .naive_local()
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 最近 N 条日志（新 → 旧）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<SyncLogEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, sync_type, status, records_affected, error_message, timestamp
            FROM sync_log
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| map_log_row(row))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 删除早于 cutoff 的日志
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
            "DELETE FROM sync_log WHERE DATE(timestamp) < ?1",
            params![cutoff.format("%Y-%m-%d").to_string()],
        )
    }
}

fn map_log_row(row: &Row) -> rusqlite::Result<SyncLogEntry> {
    let status: String = row.get(2)?;
    Ok(SyncLogEntry {
        id: row.get(0)?,
        sync_type: row.get(1)?,
        status: SyncRunStatus::from_str(&status),
        records_affected: row.get(3)?,
        error_message: row.get(4)?,
        timestamp: row.get(5)?,
    })
}
