// ==========================================
// 餐厅需求预测系统 - 应用状态
// ==========================================
// 职责: 组装数据仓储、配置、预测引擎与同步编排器
// 对外能力: generate_for_horizon / get_predictions /
//          start / stop / manual_sync / get_status / set_sync_interval
// ==========================================

use std::sync::Arc;

use crate::config::ConfigManager;
use crate::engine::DemandForecaster;
use crate::repository::store::{DataStore, SqliteDataStore};
use crate::sync::SyncOrchestrator;

/// 应用状态
///
/// 持有进程内唯一的同步编排器
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 数据仓储
    pub store: Arc<SqliteDataStore>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 需求预测引擎
    pub forecaster: Arc<DemandForecaster>,

    /// 后台同步编排器
    pub orchestrator: Arc<SyncOrchestrator>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 初始化成功
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let store = Arc::new(
            SqliteDataStore::open(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?,
        );

        let config_manager = Arc::new(
            ConfigManager::from_connection(store.connection())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let forecast_config = config_manager
            .load_forecast_config()
            .map_err(|e| format!("无法加载预测配置: {}", e))?;
        let sync_config = config_manager
            .load_sync_config()
            .map_err(|e| format!("无法加载同步配置: {}", e))?;

        tracing::debug!(?forecast_config, ?sync_config, "配置加载完成");

        let dyn_store: Arc<dyn DataStore> = store.clone();
        let forecaster = Arc::new(DemandForecaster::new(dyn_store.clone(), forecast_config));
        let orchestrator = Arc::new(SyncOrchestrator::new(
            dyn_store,
            forecaster.clone(),
            sync_config,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            store,
            config_manager,
            forecaster,
            orchestrator,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - RESTAURANT_DB_PATH 非空时直接使用
/// - 否则: 用户数据目录/restaurant-forecast/restaurant.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("RESTAURANT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./restaurant.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("restaurant-forecast");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("restaurant.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_wires_components() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("app.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.get_db_path(), db_path);

        let status = state.orchestrator.get_status();
        assert!(!status.is_running);
        assert_eq!(status.sync_interval_seconds, 3600);
        assert_eq!(state.forecaster.config().history_window_days, 60);
    }
}
