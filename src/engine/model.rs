// ==========================================
// 餐厅需求预测系统 - 季节性回归模型
// ==========================================
// 职责: 单个 (菜品, 时段) 序列的拟合与区间预测
// 特征: 截距 + 线性趋势 + 周内两阶傅里叶项 + 星期/月份/周末
// 求解: 岭回归正规方程, 部分主元高斯消元
// 区间: 80%, point ± 1.2816·σ·sqrt(1 + 1/n)
// ==========================================

use crate::engine::error::ModelFitError;
use chrono::{Datelike, NaiveDate, Weekday};
use std::cmp::Ordering;
use std::f64::consts::PI;

/// 80% 双侧区间的正态分位数
pub const Z_80: f64 = 1.2816;

/// 默认最少观测数
pub const DEFAULT_MIN_SUPPORT: usize = 5;

/// 默认岭系数（不作用于截距）
pub const DEFAULT_RIDGE_LAMBDA: f64 = 0.1;

const FEATURE_COUNT: usize = 9;
const PIVOT_EPSILON: f64 = 1e-12;

// ==========================================
// Prediction - 预测点与区间
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Prediction {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

// ==========================================
// SeriesModel - 单序列拟合接口
// ==========================================
// DemandForecaster 通过该接口拟合每个 (菜品, 时段) 序列
pub trait SeriesModel: Send + Sync {
    fn fit(&self, samples: &[(NaiveDate, f64)]) -> Result<FittedModel, ModelFitError>;
}

// ==========================================
// ForecastModel - 模型参数
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ForecastModel {
    min_support: usize,
    ridge_lambda: f64,
}

impl Default for ForecastModel {
    fn default() -> Self {
        Self {
            min_support: DEFAULT_MIN_SUPPORT,
            ridge_lambda: DEFAULT_RIDGE_LAMBDA,
        }
    }
}

impl ForecastModel {
    pub fn new(min_support: usize, ridge_lambda: f64) -> Self {
        Self {
            min_support,
            ridge_lambda: ridge_lambda.max(0.0),
        }
    }

    /// 拟合 (日期, 数量) 序列
    pub fn fit(&self, samples: &[(NaiveDate, f64)]) -> Result<FittedModel, ModelFitError> {
        if samples.len() < self.min_support {
            return Err(ModelFitError::InsufficientSupport {
                found: samples.len(),
                required: self.min_support,
            });
        }

        if let Some(index) = samples.iter().position(|(_, v)| !v.is_finite()) {
            return Err(ModelFitError::NonFiniteValue { index });
        }

        // 时间支撑
        let origin = samples.iter().map(|(d, _)| *d).min();
        let latest = samples.iter().map(|(d, _)| *d).max();
        let (origin, latest) = match (origin, latest) {
            (Some(o), Some(l)) => (o, l),
            _ => return Err(ModelFitError::NoTimeSupport),
        };
        let span_days = (latest - origin).num_days();
        if span_days <= 0 {
            return Err(ModelFitError::NoTimeSupport);
        }
        let span_days = span_days as f64;

        // 正规方程 (XᵀX + λD) β = Xᵀy
        let mut xtx = vec![vec![0.0; FEATURE_COUNT]; FEATURE_COUNT];
        let mut xty = vec![0.0; FEATURE_COUNT];
        let rows: Vec<[f64; FEATURE_COUNT]> = samples
            .iter()
            .map(|(d, _)| design_row(*d, origin, span_days))
            .collect();

        for (row, (_, y)) in rows.iter().zip(samples) {
            for i in 0..FEATURE_COUNT {
                xty[i] += row[i] * y;
                for j in 0..FEATURE_COUNT {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }
        for (i, r) in xtx.iter_mut().enumerate().skip(1) {
            r[i] += self.ridge_lambda;
        }

        let coefficients = solve_linear_system(xtx, xty)?;

        // 残差标准差
        let ssr: f64 = rows
            .iter()
            .zip(samples)
            .map(|(row, (_, y))| {
                let fitted = dot(row, &coefficients);
                (y - fitted).powi(2)
            })
            .sum();
        let n = samples.len();
        let dof = n.saturating_sub(2).max(1) as f64;
        let sigma = (ssr / dof).sqrt();

        Ok(FittedModel {
            coefficients,
            origin,
            span_days,
            sigma,
            support: n,
        })
    }

    /// 拟合后直接预测目标日期
    pub fn fit_and_predict(
        &self,
        samples: &[(NaiveDate, f64)],
        target_date: NaiveDate,
    ) -> Result<Prediction, ModelFitError> {
        self.fit(samples)?.predict(target_date)
    }
}

impl SeriesModel for ForecastModel {
    fn fit(&self, samples: &[(NaiveDate, f64)]) -> Result<FittedModel, ModelFitError> {
        ForecastModel::fit(self, samples)
    }
}

// ==========================================
// FittedModel - 已拟合系数
// ==========================================
#[derive(Debug, Clone)]
pub struct FittedModel {
    coefficients: Vec<f64>,
    origin: NaiveDate,
    span_days: f64,
    sigma: f64,
    support: usize,
}

impl FittedModel {
    pub fn predict(&self, target_date: NaiveDate) -> Result<Prediction, ModelFitError> {
        let row = design_row(target_date, self.origin, self.span_days);
        let raw = dot(&row, &self.coefficients);
        let half_width = Z_80 * self.sigma * (1.0 + 1.0 / self.support as f64).sqrt();

        if !raw.is_finite() || !half_width.is_finite() {
            return Err(ModelFitError::NonFinitePrediction);
        }

        let point = raw.max(0.0);
        Ok(Prediction {
            point,
            lower: (raw - half_width).max(0.0),
            upper: (raw + half_width).max(point),
        })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn support(&self) -> usize {
        self.support
    }
}

// ==========================================
// 内部工具
// ==========================================

fn design_row(date: NaiveDate, origin: NaiveDate, span_days: f64) -> [f64; FEATURE_COUNT] {
    let dow = f64::from(date.weekday().num_days_from_monday());
    let angle = 2.0 * PI * dow / 7.0;
    let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);

    [
        1.0,
        (date - origin).num_days() as f64 / span_days,
        angle.sin(),
        angle.cos(),
        (2.0 * angle).sin(),
        (2.0 * angle).cos(),
        dow / 6.0,
        f64::from(date.month()) / 12.0,
        if weekend { 1.0 } else { 0.0 },
    ]
}

fn dot(row: &[f64], coefficients: &[f64]) -> f64 {
    row.iter().zip(coefficients).map(|(x, b)| x * b).sum()
}

/// 部分主元高斯消元
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, ModelFitError> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(Ordering::Equal)
            })
            .unwrap_or(col);

        let pivot_value = a[pivot][col];
        if !pivot_value.is_finite() || pivot_value.abs() < PIVOT_EPSILON {
            return Err(ModelFitError::SingularSystem { column: col });
        }

        a.swap(col, pivot);
        b.swap(col, pivot);

        let pivot_row = a[col].clone();
        let pivot_rhs = b[col];
        for row in (col + 1)..n {
            let factor = a[row][col] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * pivot_row[k];
            }
            b[row] -= factor * pivot_rhs;
        }
    }

    // 回代
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(ModelFitError::SingularSystem { column: n.saturating_sub(1) });
    }
    Ok(x)
}
