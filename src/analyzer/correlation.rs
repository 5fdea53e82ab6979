// Pearson correlation and autocorrelation-based seasonality

use serde::{Deserialize, Serialize};

use super::descriptive::deviations;

/// Pearson correlation coefficient
///
/// Sequences of different length are compared over their common prefix.
/// Returns 0.0 when either side has zero variance or fewer than 2 points.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }

    let dx = deviations(&xs[..n]);
    let dy = deviations(&ys[..n]);

    // trueno returns Result for every reduction
    let var_x = f64::from(dx.sum_of_squares().unwrap_or(0.0));
    let var_y = f64::from(dy.sum_of_squares().unwrap_or(0.0));
    if var_x <= 0.0 || var_y <= 0.0 {
        return 0.0;
    }
    let cov = f64::from(dx.dot(&dy).unwrap_or(0.0));

    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Correlation between a series and itself shifted by `lag`
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    if lag == 0 || lag >= values.len() {
        return 0.0;
    }
    pearson(&values[..values.len() - lag], &values[lag..])
}

/// Dominant period found by autocorrelation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    /// Correlation at the best lag exceeded the threshold
    pub detected: bool,
    /// Best lag (0 when the series is too short to test)
    pub period: usize,
    /// Autocorrelation at the best lag
    pub strength: f64,
}

/// Look for periodicity over lags `1..=n/2`
///
/// The lag with the highest autocorrelation is the candidate period;
/// it counts as seasonal only when that correlation exceeds `threshold`.
///
/// # Example
/// ```
/// use benchguard::analyzer::detect_seasonality;
///
/// let weekly: Vec<f64> = (0..28).map(|i| if i % 7 == 0 { 30.0 } else { 10.0 }).collect();
/// let season = detect_seasonality(&weekly, 0.6);
/// assert!(season.detected);
/// assert_eq!(season.period, 7);
/// ```
pub fn detect_seasonality(values: &[f64], threshold: f64) -> Seasonality {
    let max_lag = values.len() / 2;
    let mut best = Seasonality::default();

    for lag in 1..=max_lag {
        let r = autocorrelation(values, lag);
        // Ties (multiples of the true period) keep the shortest lag
        if best.period == 0 || r > best.strength + 1e-6 {
            best.period = lag;
            best.strength = r;
        }
    }

    best.detected = best.period > 0 && best.strength > threshold;
    best
}
