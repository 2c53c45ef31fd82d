// ==========================================
// 餐厅需求预测系统 - 需求预测引擎
// ==========================================
// 职责: 对每个 (菜品, 时段) 建模或兜底, 计算置信度与备餐量, 批量落库
// 输入: HistoricalDataset (默认 60 天窗口)
// 输出: predictions 表 (按 dish_id + 日期 + 时段 覆盖)
// 红线: 单个组合的拟合失败只跳过该组合, 不影响整批
// ==========================================

use crate::config::ForecastConfig;
use crate::domain::forecast::{
    Forecast, ForecastRequest, HistoricalObservation, HorizonOutcome, ModelRunSummary,
};
use crate::domain::types::{Daypart, ForecastSource};
use crate::engine::error::{ForecastError, ForecastResult, ModelFitError};
use crate::engine::factors::{FactorContext, FactorPipeline};
use crate::engine::history::HistoricalDataset;
use crate::engine::model::{FittedModel, ForecastModel, SeriesModel, DEFAULT_RIDGE_LAMBDA};
use crate::repository::store::DataStore;
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

const FALLBACK_FACTORS: [&str; 2] = ["Limited historical data", "Fallback average"];

// ==========================================
// ModelArena - 单次调用内的已拟合模型
// ==========================================
// 生命周期等同一次 generate_for_horizon 调用，调用结束即丢弃
#[derive(Debug, Default)]
pub struct ModelArena {
    models: HashMap<(String, Daypart), FittedModel>,
}

impl ModelArena {
    pub fn insert(&mut self, dish_id: &str, daypart: Daypart, model: FittedModel) {
        self.models.insert((dish_id.to_string(), daypart), model);
    }

    pub fn get(&self, dish_id: &str, daypart: Daypart) -> Option<&FittedModel> {
        self.models.get(&(dish_id.to_string(), daypart))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// ==========================================
// DemandForecaster - 需求预测引擎
// ==========================================
pub struct DemandForecaster {
    store: Arc<dyn DataStore>,
    config: ForecastConfig,
    model: Box<dyn SeriesModel>,
    pipeline: FactorPipeline,
    last_run: Mutex<ModelRunSummary>,
}

impl DemandForecaster {
    /// 创建预测引擎
    ///
    /// # 参数
    /// - store: 数据仓储
    /// - config: 预测参数
    pub fn new(store: Arc<dyn DataStore>, config: ForecastConfig) -> Self {
        let model = ForecastModel::new(config.min_observations, DEFAULT_RIDGE_LAMBDA);
        Self::with_model(store, config, Box::new(model))
    }

    /// 使用指定的序列模型创建预测引擎
    pub fn with_model(
        store: Arc<dyn DataStore>,
        config: ForecastConfig,
        model: Box<dyn SeriesModel>,
    ) -> Self {
        let pipeline = FactorPipeline::standard(config.max_factors);
        Self {
            store,
            config,
            model,
            pipeline,
            last_run: Mutex::new(ModelRunSummary::default()),
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 以本地当天为基准生成目标日期的预测
    pub fn generate_for_horizon(&self, target_date: NaiveDate) -> ForecastResult<HorizonOutcome> {
        self.generate_for_horizon_as_of(target_date, Local::now().date_naive())
    }

    /// 以指定日期为基准生成目标日期的预测
    ///
    /// # 返回
    /// - 历史窗口为空: 零结果, 不写库
    /// - 否则: 全部预测在一个事务内覆盖写入
    #[instrument(skip(self), fields(target_date = %target_date, as_of = %as_of))]
    pub fn generate_for_horizon_as_of(
        &self,
        target_date: NaiveDate,
        as_of: NaiveDate,
    ) -> ForecastResult<HorizonOutcome> {
        let dataset =
            HistoricalDataset::load(self.store.as_ref(), as_of, self.config.history_window_days)
                .map_err(ForecastError::HistoryUnavailable)?;

        let created_at = Local::now().naive_local();

        if dataset.is_empty() {
            info!("历史窗口无数据, 跳过预测");
            self.record_run(ModelRunSummary {
                last_training: Some(created_at),
                ..ModelRunSummary::default()
            });
            return Ok(HorizonOutcome::no_data(target_date));
        }

        let dishes = dataset.dishes();
        let mut arena = ModelArena::default();
        let mut forecasts = Vec::with_capacity(dishes.len() * Daypart::ALL.len());
        let mut fallback_forecasts = 0usize;
        let mut skipped_fits = 0usize;

        for (dish_id, dish_name) in &dishes {
            for daypart in Daypart::ALL {
                let request = ForecastRequest {
                    dish_id: dish_id.clone(),
                    dish_name: dish_name.clone(),
                    daypart,
                    target_date,
                };
                let series = dataset.series(dish_id, daypart);

                if series.len() < self.config.min_observations {
                    forecasts.push(self.fallback_forecast(&request, &series, created_at));
                    fallback_forecasts += 1;
                    continue;
                }

                match self.model_forecast(&request, &series, created_at, &mut arena) {
                    Ok(forecast) => forecasts.push(forecast),
                    Err(e) => {
                        skipped_fits += 1;
                        warn!(
                            dish_id = %request.dish_id,
                            daypart = %daypart,
                            observations = series.len(),
                            error = %e,
                            "模型拟合失败, 跳过该组合"
                        );
                    }
                }
            }
        }

        let written = self
            .store
            .upsert_forecasts(&forecasts)
            .map_err(ForecastError::Persistence)?;

        let average_confidence = if forecasts.is_empty() {
            None
        } else {
            Some(forecasts.iter().map(|f| f.confidence).sum::<f64>() / forecasts.len() as f64)
        };

        let models_trained = arena.len();
        self.record_run(ModelRunSummary {
            models_trained,
            fallback_forecasts,
            skipped_fits,
            last_training: Some(created_at),
            average_confidence,
        });

        info!(
            dishes = dishes.len(),
            predictions = forecasts.len(),
            written,
            models_trained,
            fallback_forecasts,
            skipped_fits,
            "预测批次完成"
        );

        Ok(HorizonOutcome {
            predictions_generated: forecasts.len(),
            dishes_processed: dishes.len(),
            models_trained,
            target_date,
            message: format!(
                "Generated {} predictions for {} dishes",
                forecasts.len(),
                dishes.len()
            ),
        })
    }

    /// 读取指定日期的已落库预测
    pub fn get_predictions(&self, date: NaiveDate) -> ForecastResult<Vec<Forecast>> {
        self.store
            .read_forecasts(date)
            .map_err(ForecastError::Persistence)
    }

    /// 最近一次批次的建模统计
    pub fn last_run_summary(&self) -> ModelRunSummary {
        match self.last_run.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    // ==========================================
    // 内部方法
    // ==========================================

    /// 观测不足时的兜底: 均值(无观测时用默认需求), 固定置信度
    fn fallback_forecast(
        &self,
        request: &ForecastRequest,
        series: &[&HistoricalObservation],
        created_at: NaiveDateTime,
    ) -> Forecast {
        let average = if series.is_empty() {
            self.config.fallback_default_demand
        } else {
            series.iter().map(|o| o.quantity_sold as f64).sum::<f64>() / series.len() as f64
        };

        let predicted_demand = (average.round() as i64).max(1);
        let recommended_prep =
            ((predicted_demand as f64 * self.config.fallback_prep_multiplier).round() as i64)
                .max(2);

        debug!(
            dish_id = %request.dish_id,
            daypart = %request.daypart,
            observations = series.len(),
            predicted_demand,
            "观测不足, 使用兜底预测"
        );

        Forecast {
            dish_id: request.dish_id.clone(),
            dish_name: request.dish_name.clone(),
            daypart: request.daypart,
            target_date: request.target_date,
            predicted_demand,
            confidence: self.config.fallback_confidence,
            recommended_prep,
            factors: FALLBACK_FACTORS.iter().map(|s| s.to_string()).collect(),
            source: ForecastSource::Fallback,
            created_at,
        }
    }

    fn model_forecast(
        &self,
        request: &ForecastRequest,
        series: &[&HistoricalObservation],
        created_at: NaiveDateTime,
        arena: &mut ModelArena,
    ) -> Result<Forecast, ModelFitError> {
        let samples: Vec<(NaiveDate, f64)> = series
            .iter()
            .map(|o| (o.date, o.quantity_sold as f64))
            .collect();

        let fitted = self.model.fit(&samples)?;
        let prediction = fitted.predict(request.target_date)?;
        arena.insert(&request.dish_id, request.daypart, fitted);

        let historical_mean = samples.iter().map(|(_, v)| v).sum::<f64>() / samples.len() as f64;
        let confidence = self.model_confidence(prediction.width(), historical_mean);

        let predicted_demand = (prediction.point.round() as i64).max(1);
        let multiplier = if confidence > self.config.high_confidence_threshold {
            self.config.high_confidence_multiplier
        } else {
            self.config.low_confidence_multiplier
        };
        let recommended_prep = ((predicted_demand as f64 * multiplier).round() as i64).max(2);

        let factors = self.pipeline.compose(&FactorContext {
            target_date: request.target_date,
            daypart: request.daypart,
            series,
        });

        Ok(Forecast {
            dish_id: request.dish_id.clone(),
            dish_name: request.dish_name.clone(),
            daypart: request.daypart,
            target_date: request.target_date,
            predicted_demand,
            confidence,
            recommended_prep,
            factors,
            source: ForecastSource::Model,
            created_at,
        })
    }

    /// 置信度 = 100 - 区间宽度 / 历史均值 × 100, 限制在 [min, max], 保留一位小数
    fn model_confidence(&self, interval_width: f64, historical_mean: f64) -> f64 {
        if historical_mean <= 0.0 {
            return self.config.min_confidence;
        }
        let raw = 100.0 - interval_width / historical_mean * 100.0;
        let clamped = raw.clamp(self.config.min_confidence, self.config.max_confidence);
        (clamped * 10.0).round() / 10.0
    }

    fn record_run(&self, summary: ModelRunSummary) {
        match self.last_run.lock() {
            Ok(mut guard) => *guard = summary,
            Err(poisoned) => *poisoned.into_inner() = summary,
        }
    }
}
