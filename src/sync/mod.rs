// ==========================================
// 餐厅需求预测系统 - 同步编排层
// ==========================================
// 职责: 后台周期任务、手动同步、运行状态
// ==========================================

pub mod error;
pub mod orchestrator;
pub mod status;

pub use error::{SyncError, SyncResult};
pub use orchestrator::SyncOrchestrator;
pub use status::StatusTracker;
