// ==========================================
// 餐厅需求预测系统 - 配置层
// ==========================================
// 职责: 系统配置管理,支持 config_kv 覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod settings;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use settings::{ForecastConfig, SyncConfig};
