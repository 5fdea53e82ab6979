// Ordinary least squares trend fitting
//
// Values are fitted either against their index (one step per run) or against
// hours elapsed since the first timestamp. A degenerate fit (fewer than two
// points, or every x identical) yields slope = intercept = correlation = 0.
// Any spread in x counts, however small its scale.

use serde::{Deserialize, Serialize};
use trueno::Vector;

use super::correlation::pearson;
use super::descriptive::{deviations, mean};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Fitted line `y = intercept + slope * x`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation between x and y
    pub correlation: f64,
}

impl LinearTrend {
    /// Fit against the index of each value
    ///
    /// # Example
    /// ```
    /// use benchguard::analyzer::LinearTrend;
    ///
    /// let trend = LinearTrend::fit(&[100.0, 105.0, 110.0, 115.0]);
    /// assert!((trend.slope - 5.0).abs() < 1e-9);
    /// assert!((trend.intercept - 100.0).abs() < 1e-9);
    /// assert!(trend.correlation > 0.99);
    /// ```
    pub fn fit(values: &[f64]) -> Self {
        let xs: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        Self::fit_xy(&xs, values)
    }

    /// Fit against hours elapsed since the first timestamp (milliseconds)
    pub fn fit_timed(points: &[(u64, f64)]) -> Self {
        let Some(&(origin, _)) = points.first() else {
            return Self::default();
        };
        let xs: Vec<f64> = points
            .iter()
            .map(|&(ts, _)| (ts as f64 - origin as f64) / MILLIS_PER_HOUR)
            .collect();
        let ys: Vec<f64> = points.iter().map(|&(_, v)| v).collect();
        Self::fit_xy(&xs, &ys)
    }

    /// Fit `ys` against `xs` (common prefix when lengths differ)
    pub fn fit_xy(xs: &[f64], ys: &[f64]) -> Self {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return Self::default();
        }
        let (xs, ys) = (&xs[..n], &ys[..n]);

        let dx = deviations(xs);
        let dy = deviations(ys);
        let sxx = f64::from(dx.sum_of_squares().unwrap_or(0.0));
        if sxx <= 0.0 || !sxx.is_finite() {
            return Self::default();
        }
        let sxy = f64::from(dx.dot(&dy).unwrap_or(0.0));

        let slope = sxy / sxx;
        let intercept = mean(ys) - slope * mean(xs);

        Self {
            slope,
            intercept,
            correlation: pearson(xs, ys),
        }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    pub fn r_squared(&self) -> f64 {
        self.correlation * self.correlation
    }

    /// Residual standard error against index-fitted `values`
    ///
    /// Uses n - 2 degrees of freedom; 0.0 with two points or fewer.
    pub fn residual_std_error(&self, values: &[f64]) -> f64 {
        if values.len() <= 2 {
            return 0.0;
        }
        let residuals: Vec<f32> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (v - self.predict(i as f64)) as f32)
            .collect();
        let sse = f64::from(Vector::from_slice(&residuals).sum_of_squares().unwrap_or(0.0));
        (sse / (values.len() - 2) as f64).sqrt()
    }
}
