// ==========================================
// 餐厅需求预测系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 规则: 单个 (菜品, 时段) 的建模失败不向上传播
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 单次拟合失败（捕获后跳过该组合）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelFitError {
    #[error("观测数不足: 需要 {required}, 实际 {found}")]
    InsufficientSupport { found: usize, required: usize },

    #[error("观测值非有限数 (index={index})")]
    NonFiniteValue { index: usize },

    #[error("所有观测位于同一日期，缺少时间支撑")]
    NoTimeSupport,

    #[error("正规方程奇异 (column={column})")]
    SingularSystem { column: usize },

    #[error("预测结果非有限数")]
    NonFinitePrediction,
}

/// 预测批次错误
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("历史数据读取失败: {0}")]
    HistoryUnavailable(#[source] RepositoryError),

    #[error("预测结果持久化失败: {0}")]
    Persistence(#[source] RepositoryError),
}

pub type ForecastResult<T> = Result<T, ForecastError>;
