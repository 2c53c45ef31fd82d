// ==========================================
// 餐厅需求预测系统 - 预测因子规则管道
// ==========================================
// 职责: 为预测结果生成可读的影响因子说明
// 规则顺序: 工作日/周末 → 时段 → 趋势 → 季节
// 约束: 每条规则是 (目标日期, 历史序列) 的纯函数; 结果截断至 4 条
// ==========================================

use crate::domain::forecast::HistoricalObservation;
use crate::domain::types::{is_weekend, weekday_name, Daypart};
use chrono::{Datelike, NaiveDate};

/// 默认最多因子条数
pub const MAX_FACTORS: usize = 4;

// 周末倍率阈值
const WEEKEND_BOOST_RATIO: f64 = 1.2;
const WEEKEND_DECLINE_RATIO: f64 = 0.8;

// 趋势阈值
const TREND_RECENT_WINDOW: usize = 10;
const TREND_MIN_RECENT: usize = 5;
const TREND_UP_RATIO: f64 = 1.15;
const TREND_DOWN_RATIO: f64 = 0.85;

// ==========================================
// FactorContext - 规则输入
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct FactorContext<'a> {
    pub target_date: NaiveDate,
    pub daypart: Daypart,
    /// 同一 (菜品, 时段) 的历史观测，按日期升序
    pub series: &'a [&'a HistoricalObservation],
}

// ==========================================
// FactorRule - 单条规则
// ==========================================
pub trait FactorRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &FactorContext<'_>) -> Option<String>;
}

/// 工作日/周末规则
pub struct WeekdayWeekendRule;

impl FactorRule for WeekdayWeekendRule {
    fn name(&self) -> &'static str {
        "weekday_weekend"
    }

    fn evaluate(&self, ctx: &FactorContext<'_>) -> Option<String> {
        let day = weekday_name(ctx.target_date);
        if !is_weekend(ctx.target_date) {
            return Some(format!("Weekday pattern ({})", day));
        }

        // day_of_week: 5=周六, 6=周日
        let (weekend, weekday): (Vec<&&HistoricalObservation>, Vec<&&HistoricalObservation>) =
            ctx.series.iter().partition(|o| o.day_of_week >= 5);

        let weekend_mean = mean(&quantities(&weekend))?;
        let weekday_mean = mean(&quantities(&weekday))?;

        if weekend_mean > weekday_mean * WEEKEND_BOOST_RATIO {
            Some(format!("Weekend boost ({})", day))
        } else if weekend_mean < weekday_mean * WEEKEND_DECLINE_RATIO {
            Some(format!("Weekend decline ({})", day))
        } else {
            None
        }
    }
}

/// 时段规则
pub struct DaypartRule;

impl FactorRule for DaypartRule {
    fn name(&self) -> &'static str {
        "daypart"
    }

    fn evaluate(&self, ctx: &FactorContext<'_>) -> Option<String> {
        let label = match ctx.daypart {
            Daypart::Morning => "Breakfast/morning rush",
            Daypart::Afternoon => "Lunch period demand",
            Daypart::Evening => "Dinner rush period",
        };
        Some(label.to_string())
    }
}

/// 近期趋势规则（最近 10 个观测 vs 全部均值）
pub struct TrendRule;

impl FactorRule for TrendRule {
    fn name(&self) -> &'static str {
        "trend"
    }

    fn evaluate(&self, ctx: &FactorContext<'_>) -> Option<String> {
        let all: Vec<f64> = ctx.series.iter().map(|o| o.quantity_sold as f64).collect();
        let recent = &all[all.len().saturating_sub(TREND_RECENT_WINDOW)..];
        if recent.len() < TREND_MIN_RECENT {
            return None;
        }

        let overall_mean = mean(&all)?;
        let recent_mean = mean(recent)?;

        let label = if recent_mean > overall_mean * TREND_UP_RATIO {
            "Upward trend detected"
        } else if recent_mean < overall_mean * TREND_DOWN_RATIO {
            "Downward trend detected"
        } else {
            "Stable demand pattern"
        };
        Some(label.to_string())
    }
}

/// 季节规则
pub struct SeasonRule;

impl FactorRule for SeasonRule {
    fn name(&self) -> &'static str {
        "season"
    }

    fn evaluate(&self, ctx: &FactorContext<'_>) -> Option<String> {
        match ctx.target_date.month() {
            12 | 1 | 2 => Some("Winter seasonality".to_string()),
            6..=8 => Some("Summer seasonality".to_string()),
            _ => None,
        }
    }
}

// ==========================================
// FactorPipeline - 规则组合
// ==========================================
pub struct FactorPipeline {
    rules: Vec<Box<dyn FactorRule>>,
    max_factors: usize,
}

impl Default for FactorPipeline {
    fn default() -> Self {
        Self::standard(MAX_FACTORS)
    }
}

impl FactorPipeline {
    /// 标准规则顺序
    pub fn standard(max_factors: usize) -> Self {
        Self {
            rules: vec![
                Box::new(WeekdayWeekendRule),
                Box::new(DaypartRule),
                Box::new(TrendRule),
                Box::new(SeasonRule),
            ],
            max_factors,
        }
    }

    pub fn with_rules(rules: Vec<Box<dyn FactorRule>>, max_factors: usize) -> Self {
        Self { rules, max_factors }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn compose(&self, ctx: &FactorContext<'_>) -> Vec<String> {
        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(ctx))
            .take(self.max_factors)
            .collect()
    }
}

fn quantities(obs: &[&&HistoricalObservation]) -> Vec<f64> {
    obs.iter().map(|o| o.quantity_sold as f64).collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn observations(start: &str, qty: &[i64]) -> Vec<HistoricalObservation> {
        let start = d(start);
        qty.iter()
            .enumerate()
            .map(|(i, q)| {
                HistoricalObservation::new(
                    start + Duration::days(i as i64),
                    Daypart::Evening,
                    "d1",
                    "Dish",
                    *q,
                )
            })
            .collect()
    }

    fn ctx<'a>(
        target: &str,
        daypart: Daypart,
        series: &'a [&'a HistoricalObservation],
    ) -> FactorContext<'a> {
        FactorContext {
            target_date: d(target),
            daypart,
            series,
        }
    }

    #[test]
    fn test_weekday_label() {
        let series: Vec<&HistoricalObservation> = Vec::new();
        // 2024-05-06 周一
        let c = ctx("2024-05-06", Daypart::Morning, &series);
        assert_eq!(
            WeekdayWeekendRule.evaluate(&c).as_deref(),
            Some("Weekday pattern (Monday)")
        );
    }

    #[test]
    fn test_weekend_boost_and_decline() {
        // 2024-05-06 周一起 14 天: 周末 12, 工作日 4
        let boosted: Vec<i64> = (0..14).map(|i| if i % 7 >= 5 { 12 } else { 4 }).collect();
        let obs = observations("2024-05-06", &boosted);
        let refs: Vec<&HistoricalObservation> = obs.iter().collect();
        let c = ctx("2024-05-25", Daypart::Evening, &refs);
        assert_eq!(
            WeekdayWeekendRule.evaluate(&c).as_deref(),
            Some("Weekend boost (Saturday)")
        );

        let declined: Vec<i64> = (0..14).map(|i| if i % 7 >= 5 { 1 } else { 10 }).collect();
        let obs = observations("2024-05-06", &declined);
        let refs: Vec<&HistoricalObservation> = obs.iter().collect();
        let c = ctx("2024-05-26", Daypart::Evening, &refs);
        assert_eq!(
            WeekdayWeekendRule.evaluate(&c).as_deref(),
            Some("Weekend decline (Sunday)")
        );
    }

    #[test]
    fn test_weekend_without_history_has_no_label() {
        // 只有工作日历史
        let obs = observations("2024-05-06", &[3, 3, 3, 3, 3]);
        let refs: Vec<&HistoricalObservation> = obs.iter().collect();
        let c = ctx("2024-05-25", Daypart::Evening, &refs);
        assert!(WeekdayWeekendRule.evaluate(&c).is_none());
    }

    #[test]
    fn test_trend_rule() {
        let up: Vec<i64> = (0..20).map(|i| if i < 10 { 2 } else { 10 }).collect();
        let obs = observations("2024-04-01", &up);
        let refs: Vec<&HistoricalObservation> = obs.iter().collect();
        let c = ctx("2024-05-06", Daypart::Evening, &refs);
        assert_eq!(TrendRule.evaluate(&c).as_deref(), Some("Upward trend detected"));

        let down: Vec<i64> = (0..20).map(|i| if i < 10 { 10 } else { 2 }).collect();
        let obs = observations("2024-04-01", &down);
        let refs: Vec<&HistoricalObservation> = obs.iter().collect();
        let c = ctx("2024-05-06", Daypart::Evening, &refs);
        assert_eq!(TrendRule.evaluate(&c).as_deref(), Some("Downward trend detected"));

        let flat = observations("2024-04-01", &[5; 8]);
        let refs: Vec<&HistoricalObservation> = flat.iter().collect();
        let c = ctx("2024-05-06", Daypart::Evening, &refs);
        assert_eq!(TrendRule.evaluate(&c).as_deref(), Some("Stable demand pattern"));

        let short = observations("2024-04-01", &[5; 4]);
        let refs: Vec<&HistoricalObservation> = short.iter().collect();
        let c = ctx("2024-05-06", Daypart::Evening, &refs);
        assert!(TrendRule.evaluate(&c).is_none());
    }

    #[test]
    fn test_pipeline_order_and_truncation() {
        let obs = observations("2024-06-03", &[5; 8]);
        let refs: Vec<&HistoricalObservation> = obs.iter().collect();
        // 2024-07-02 周二, 夏季
        let c = ctx("2024-07-02", Daypart::Afternoon, &refs);

        let factors = FactorPipeline::default().compose(&c);
        assert_eq!(
            factors,
            vec![
                "Weekday pattern (Tuesday)",
                "Lunch period demand",
                "Stable demand pattern",
                "Summer seasonality"
            ]
        );

        let truncated = FactorPipeline::standard(2).compose(&c);
        assert_eq!(truncated.len(), 2);
        assert_eq!(
            FactorPipeline::default().rule_names(),
            vec!["weekday_weekend", "daypart", "trend", "season"]
        );
    }

    #[test]
    fn test_custom_rule_order() {
        let series: Vec<&HistoricalObservation> = Vec::new();
        let c = ctx("2024-07-02", Daypart::Afternoon, &series);

        let pipeline = FactorPipeline::with_rules(vec![Box::new(SeasonRule), Box::new(DaypartRule)], 4);
        assert_eq!(pipeline.rule_names(), vec!["season", "daypart"]);
        assert_eq!(
            pipeline.compose(&c),
            vec!["Summer seasonality", "Lunch period demand"]
        );

        let single = FactorPipeline::with_rules(vec![Box::new(SeasonRule), Box::new(DaypartRule)], 1);
        assert_eq!(single.compose(&c), vec!["Summer seasonality"]);
    }

    #[test]
    fn test_winter_label() {
        let series: Vec<&HistoricalObservation> = Vec::new();
        let c = ctx("2024-01-10", Daypart::Morning, &series);
        assert_eq!(SeasonRule.evaluate(&c).as_deref(), Some("Winter seasonality"));
        let c = ctx("2024-04-10", Daypart::Morning, &series);
        assert!(SeasonRule.evaluate(&c).is_none());
    }
}
