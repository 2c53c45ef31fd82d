// ==========================================
// 餐厅需求预测系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod forecast_repo;
pub mod inventory_txn_repo;
pub mod order_history_repo;
pub mod sales_analytics_repo;
pub mod store;
pub mod sync_log_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use forecast_repo::ForecastRepository;
pub use inventory_txn_repo::InventoryTransactionRepository;
pub use order_history_repo::OrderHistoryRepository;
pub use sales_analytics_repo::SalesAnalyticsRepository;
pub use store::{DataStore, SqliteDataStore};
pub use sync_log_repo::SyncLogRepository;
