// ==========================================
// 餐厅需求预测系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod forecast;
pub mod sales;
pub mod sync;
pub mod types;

// 重导出核心类型
pub use forecast::{
    CompletedOrderLine, Forecast, ForecastRequest, HistoricalObservation, HorizonOutcome,
    ModelRunSummary,
};
pub use sales::{DailySalesSummary, DaypartSales};
pub use sync::{
    RetentionCutoffs, RetentionReport, SyncBreakdown, SyncCycleResult, SyncLogEntry, SyncStatus,
};
pub use types::{Daypart, ForecastSource, SyncRunStatus};
