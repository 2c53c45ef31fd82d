// ==========================================
// 餐厅需求预测系统 - 历史数据集
// ==========================================
// 职责: 将已完成订单明细聚合为 (日期, 时段, 菜品) 观测
// 规则: 0-5 点的订单不计入任何时段; 空窗口返回空数据集
// ==========================================

use crate::domain::forecast::{CompletedOrderLine, HistoricalObservation};
use crate::domain::types::Daypart;
use crate::repository::error::RepositoryResult;
use crate::repository::store::DataStore;
use chrono::{NaiveDate, Timelike};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

// ==========================================
// HistoricalDataset - 只读历史观测视图
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct HistoricalDataset {
    // 按 (date, dish_id, daypart) 排序
    observations: Vec<HistoricalObservation>,
}

impl HistoricalDataset {
    /// 从数据仓储加载 [as_of - window_days, as_of] 的历史
    pub fn load(
        store: &dyn DataStore,
        as_of: NaiveDate,
        window_days: u32,
    ) -> RepositoryResult<Self> {
        let lines = store.load_completed_orders(as_of, window_days)?;
        let dataset = Self::from_lines(lines);
        debug!(
            as_of = %as_of,
            window_days,
            observations = dataset.len(),
            "历史数据集加载完成"
        );
        Ok(dataset)
    }

    /// 聚合订单明细
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = CompletedOrderLine>,
    {
        let mut buckets: BTreeMap<(NaiveDate, String, Daypart), (String, i64)> = BTreeMap::new();

        for line in lines {
            let Some(daypart) = Daypart::from_hour(line.ordered_at.hour()) else {
                continue;
            };
            let key = (line.ordered_at.date(), line.dish_id, daypart);
            let entry = buckets.entry(key).or_insert_with(|| (line.dish_name, 0));
            entry.1 += line.quantity;
        }

        let observations = buckets
            .into_iter()
            .map(|((date, dish_id, daypart), (dish_name, qty))| {
                HistoricalObservation::new(date, daypart, dish_id, dish_name, qty)
            })
            .collect();

        Self { observations }
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn observations(&self) -> &[HistoricalObservation] {
        &self.observations
    }

    /// 去重后的 (dish_id, dish_name)，按首次出现顺序
    pub fn dishes(&self) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        self.observations
            .iter()
            .filter(|o| seen.insert(o.dish_id.as_str()))
            .map(|o| (o.dish_id.clone(), o.dish_name.clone()))
            .collect()
    }

    /// 指定菜品与时段的观测序列（按日期升序）
    pub fn series(&self, dish_id: &str, daypart: Daypart) -> Vec<&HistoricalObservation> {
        self.observations
            .iter()
            .filter(|o| o.dish_id == dish_id && o.daypart == daypart)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn line(ts: &str, dish: &str, qty: i64) -> CompletedOrderLine {
        CompletedOrderLine {
            ordered_at: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            dish_id: dish.to_string(),
            dish_name: format!("Dish {}", dish),
            quantity: qty,
        }
    }

    #[test]
    fn test_aggregates_by_date_daypart_dish() {
        let ds = HistoricalDataset::from_lines(vec![
            line("2024-05-02 08:00:00", "b", 1),
            line("2024-05-01 09:00:00", "a", 2),
            line("2024-05-01 10:30:00", "a", 3),
            line("2024-05-01 13:00:00", "a", 1),
            line("2024-05-01 03:00:00", "a", 9),
        ]);

        assert_eq!(ds.len(), 3);
        let first = &ds.observations()[0];
        assert_eq!(first.dish_id, "a");
        assert_eq!(first.daypart, Daypart::Morning);
        assert_eq!(first.quantity_sold, 5);
        assert_eq!(first.day_of_week, 2); // 2024-05-01 周三
        assert_eq!(first.month, 5);

        let dishes = ds.dishes();
        assert_eq!(
            dishes,
            vec![
                ("a".to_string(), "Dish a".to_string()),
                ("b".to_string(), "Dish b".to_string())
            ]
        );
    }

    #[test]
    fn test_series_is_date_ordered() {
        let ds = HistoricalDataset::from_lines(vec![
            line("2024-05-03 19:00:00", "a", 4),
            line("2024-05-01 19:00:00", "a", 2),
            line("2024-05-02 19:00:00", "a", 3),
            line("2024-05-02 12:00:00", "a", 7),
        ]);

        let series = ds.series("a", Daypart::Evening);
        let qty: Vec<i64> = series.iter().map(|o| o.quantity_sold).collect();
        assert_eq!(qty, vec![2, 3, 4]);
        assert!(ds.series("a", Daypart::Morning).is_empty());
    }

    #[test]
    fn test_empty_input() {
        let ds = HistoricalDataset::from_lines(Vec::new());
        assert!(ds.is_empty());
        assert!(ds.dishes().is_empty());
    }
}
