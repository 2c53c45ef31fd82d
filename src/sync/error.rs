// ==========================================
// 餐厅需求预测系统 - 同步层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 规则: 分析/清理失败中止本周期, 下一周期重试
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("销售分析缓存失败: {0}")]
    Analytics(#[source] RepositoryError),

    #[error("数据保留清理失败: {0}")]
    Retention(#[source] RepositoryError),

    #[error("配置无效: {0}")]
    InvalidConfiguration(String),

    #[error("同步任务异常退出: {0}")]
    Worker(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
