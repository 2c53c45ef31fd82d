// ==========================================
// 餐厅需求预测系统 - 引擎层
// ==========================================
// 职责: 历史聚合、回归建模、因子说明、预测编排
// 红线: 引擎只依赖 DataStore 契约, 不直接访问数据库
// ==========================================

pub mod error;
pub mod factors;
pub mod forecaster;
pub mod history;
pub mod model;

// 重导出核心引擎
pub use error::{ForecastError, ForecastResult, ModelFitError};
pub use factors::{FactorContext, FactorPipeline, FactorRule};
pub use forecaster::{DemandForecaster, ModelArena};
pub use history::HistoricalDataset;
pub use model::{FittedModel, ForecastModel, Prediction, SeriesModel};
