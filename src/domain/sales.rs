// ==========================================
// 餐厅需求预测系统 - 销售汇总领域模型
// ==========================================
// 职责: 单日分时段销售汇总（分析缓存的数据源）
// ==========================================

use crate::domain::types::Daypart;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 单时段销售指标
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DaypartSales {
    pub orders: i64,
    pub revenue: f64,
    pub avg_order: f64,
}

impl DaypartSales {
    pub fn new(orders: i64, revenue: f64) -> Self {
        let avg_order = if orders > 0 {
            revenue / orders as f64
        } else {
            0.0
        };
        Self {
            orders,
            revenue,
            avg_order,
        }
    }
}

/// 单日销售汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySalesSummary {
    pub date: NaiveDate,
    pub morning: DaypartSales,
    pub afternoon: DaypartSales,
    pub evening: DaypartSales,
    pub total: DaypartSales,
}

impl DailySalesSummary {
    /// 由三个时段构造，合计由时段累加得出
    pub fn from_dayparts(
        date: NaiveDate,
        morning: DaypartSales,
        afternoon: DaypartSales,
        evening: DaypartSales,
    ) -> Self {
        let total = DaypartSales::new(
            morning.orders + afternoon.orders + evening.orders,
            morning.revenue + afternoon.revenue + evening.revenue,
        );
        Self {
            date,
            morning,
            afternoon,
            evening,
            total,
        }
    }

    pub fn daypart(&self, daypart: Daypart) -> &DaypartSales {
        match daypart {
            Daypart::Morning => &self.morning,
            Daypart::Afternoon => &self.afternoon,
            Daypart::Evening => &self.evening,
        }
    }
}
