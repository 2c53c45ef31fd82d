// ==========================================
// 餐厅需求预测系统 - 后台同步主入口
// ==========================================
// 流程: 初始化日志 → 组装 AppState → 启动同步 → 等待 Ctrl-C → 停止
// ==========================================

use anyhow::{anyhow, Context};
use restaurant_forecast::app::{get_default_db_path, AppState};
use restaurant_forecast::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统（RESTAURANT_LOG_FORMAT=json 时输出 JSON 行）
    match std::env::var("RESTAURANT_LOG_FORMAT").as_deref() {
        Ok("json") => logging::init_json(),
        _ => logging::init(),
    }

    tracing::info!("==================================================");
    tracing::info!("{}", restaurant_forecast::APP_NAME);
    tracing::info!("系统版本: {}", restaurant_forecast::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let app_state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    app_state.orchestrator.start().await;

    tokio::signal::ctrl_c()
        .await
        .context("无法监听 Ctrl-C 信号")?;
    tracing::info!("收到退出信号, 正在停止后台同步...");

    app_state.orchestrator.stop().await?;

    let status = app_state.orchestrator.get_status();
    tracing::info!(
        total_errors = status.total_error_count,
        last_sync = ?status.last_sync,
        "已退出"
    );
    Ok(())
}
