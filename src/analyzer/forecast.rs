// Linear forecasting and hold-out accuracy
//
// The forecast extends the index-fitted line `horizon` steps past the last
// observation with a symmetric +/- 1.96 * stderr band. Accuracy is measured by
// fitting on the first 80% of the series and scoring the last 20%.

use serde::{Deserialize, Serialize};
use trueno::Vector;

use super::descriptive::mean;
use super::trend::LinearTrend;

const Z_95: f64 = 1.96;
const HOLDOUT_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Steps past the last observation (1-based)
    pub step: usize,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub trend: LinearTrend,
    pub std_error: f64,
    pub points: Vec<ForecastPoint>,
}

/// Back-tested forecast accuracy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAccuracy {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// Mean absolute percentage error over non-zero actuals
    pub mape: f64,
    /// Correlation squared of the training fit
    pub r_squared: f64,
}

/// Project `values` forward `horizon` steps
///
/// An empty series produces an empty forecast.
pub fn forecast(values: &[f64], horizon: usize) -> Forecast {
    if values.is_empty() {
        return Forecast::default();
    }

    let trend = LinearTrend::fit(values);
    let std_error = trend.residual_std_error(values);
    let last = values.len() - 1;

    let points = (1..=horizon)
        .map(|step| {
            let value = if values.len() < 2 {
                values[0]
            } else {
                trend.predict((last + step) as f64)
            };
            ForecastPoint {
                step,
                value,
                lower: value - Z_95 * std_error,
                upper: value + Z_95 * std_error,
            }
        })
        .collect();

    Forecast {
        trend,
        std_error,
        points,
    }
}

/// Score a linear forecast by holding out the last 20% of the series
///
/// Returns `None` when fewer than two training points would remain.
///
/// # Example
/// ```
/// use benchguard::analyzer::backtest;
///
/// let series: Vec<f64> = (0..10).map(|i| 50.0 + 2.0 * i as f64).collect();
/// let accuracy = backtest(&series).unwrap();
/// assert!(accuracy.mae < 1e-9);
/// assert!(accuracy.r_squared > 0.99);
/// ```
pub fn backtest(values: &[f64]) -> Option<ForecastAccuracy> {
    let holdout = ((values.len() as f64 * HOLDOUT_FRACTION).floor() as usize).max(1);
    if values.len() < holdout + 2 {
        return None;
    }

    let split = values.len() - holdout;
    let (train, test) = values.split_at(split);
    let trend = LinearTrend::fit(train);

    let errors: Vec<f64> = test
        .iter()
        .enumerate()
        .map(|(offset, actual)| actual - trend.predict((split + offset) as f64))
        .collect();
    let absolute: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
    let percentage: Vec<f64> = test
        .iter()
        .zip(&errors)
        .filter(|(actual, _)| **actual != 0.0)
        .map(|(actual, error)| (error / actual).abs() * 100.0)
        .collect();

    let lanes: Vec<f32> = errors.iter().map(|&e| e as f32).collect();
    let mse = f64::from(Vector::from_slice(&lanes).sum_of_squares().unwrap_or(0.0)) / errors.len() as f64;

    Some(ForecastAccuracy {
        mae: mean(&absolute),
        mse,
        rmse: mse.sqrt(),
        mape: mean(&percentage),
        r_squared: trend.r_squared(),
    })
}
