// ==========================================
// 餐厅需求预测系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 菜品分时段需求预测 + 后台定时同步
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 预测规则
pub mod engine;

// 同步层 - 后台编排
pub mod sync;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 应用层 - 进程组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Daypart, ForecastSource, SyncRunStatus};

// 领域实体
pub use domain::{
    DailySalesSummary, Forecast, HistoricalObservation, HorizonOutcome, ModelRunSummary,
    SyncCycleResult, SyncStatus,
};

// 引擎
pub use engine::{DemandForecaster, ForecastError, ForecastModel, HistoricalDataset};

// 同步
pub use sync::{SyncError, SyncOrchestrator};

// 仓储
pub use repository::{DataStore, RepositoryError, SqliteDataStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "餐厅需求预测系统";
