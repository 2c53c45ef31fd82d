// ==========================================
// 餐厅需求预测系统 - 应用层
// ==========================================
// 职责: 进程级组装, 向上暴露预测与同步能力
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
