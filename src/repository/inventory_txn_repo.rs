// ==========================================
// 餐厅需求预测系统 - 库存流水仓储
// ==========================================
// 职责: inventory_transactions 表的保留期清理
// 说明: 流水写入由 POS 下单流程负责，此处只做清理
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct InventoryTransactionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryTransactionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 删除发生日期早于 cutoff 的流水
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
            "DELETE FROM inventory_transactions WHERE DATE(timestamp) < ?1",
            params![cutoff.format("%Y-%m-%d").to_string()],
        )
    }
}
