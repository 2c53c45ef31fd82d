// ==========================================
// 餐厅需求预测系统 - 预测领域模型
// ==========================================
// 职责: 历史观测、预测请求、预测结果
// 红线: 预测值 ≥ 1, 备餐量 ≥ 2, 因子最多 4 条
// ==========================================

use crate::domain::types::{Daypart, ForecastSource};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// CompletedOrderLine - 已完成订单明细
// ==========================================
// 数据仓储返回的原始行，由 HistoricalDataset 聚合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedOrderLine {
    pub ordered_at: NaiveDateTime, // 下单时间（本地时间）
    pub dish_id: String,
    pub dish_name: String,
    pub quantity: i64,
}

// ==========================================
// HistoricalObservation - 历史观测
// ==========================================
// 每个 (date, daypart, dish_id) 仅一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalObservation {
    pub date: NaiveDate,
    pub daypart: Daypart,
    pub dish_id: String,
    pub dish_name: String,
    pub quantity_sold: i64,
    pub day_of_week: u32, // 0=周一 … 6=周日
    pub month: u32,       // 1-12
}

impl HistoricalObservation {
    pub fn new(
        date: NaiveDate,
        daypart: Daypart,
        dish_id: impl Into<String>,
        dish_name: impl Into<String>,
        quantity_sold: i64,
    ) -> Self {
        Self {
            date,
            daypart,
            dish_id: dish_id.into(),
            dish_name: dish_name.into(),
            quantity_sold: quantity_sold.max(0),
            day_of_week: date.weekday().num_days_from_monday(),
            month: date.month(),
        }
    }
}

// ==========================================
// ForecastRequest - 预测请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub dish_id: String,
    pub dish_name: String,
    pub daypart: Daypart,
    pub target_date: NaiveDate,
}

// ==========================================
// Forecast - 预测结果
// ==========================================
// 按 (dish_id, target_date, daypart) 幂等覆盖
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub dish_id: String,
    pub dish_name: String,
    pub daypart: Daypart,
    pub target_date: NaiveDate,
    pub predicted_demand: i64,
    pub confidence: f64,
    pub recommended_prep: i64,
    pub factors: Vec<String>,
    pub source: ForecastSource,
    pub created_at: NaiveDateTime,
}

impl Forecast {
    /// 覆盖键
    pub fn key(&self) -> (&str, NaiveDate, Daypart) {
        (&self.dish_id, self.target_date, self.daypart)
    }
}

// ==========================================
// HorizonOutcome - 单日预测批次结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonOutcome {
    pub predictions_generated: usize,
    pub dishes_processed: usize,
    pub models_trained: usize,
    pub target_date: NaiveDate,
    pub message: String,
}

impl HorizonOutcome {
    /// 历史窗口为空时的零结果
    pub fn no_data(target_date: NaiveDate) -> Self {
        Self {
            predictions_generated: 0,
            dishes_processed: 0,
            models_trained: 0,
            target_date,
            message: "No historical data available".to_string(),
        }
    }
}

// ==========================================
// ModelRunSummary - 最近一次建模运行统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRunSummary {
    pub models_trained: usize,
    pub fallback_forecasts: usize,
    pub skipped_fits: usize,
    pub last_training: Option<NaiveDateTime>,
    pub average_confidence: Option<f64>,
}
