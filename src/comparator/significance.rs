// Approximate two-sample significance test on summary statistics
//
// Only the harness summaries are available (mean, stddev, iteration count),
// so the test works from those: pooled standard deviation, standard error from
// both sample sizes, t = (current - baseline) / se.
//
// The p-value comes from a fixed breakpoint table, NOT from the t
// distribution:
//
//   |t| > 3.0  -> 0.001
//   |t| > 2.5  -> 0.01
//   |t| > 2.0  -> 0.05
//   |t| > 1.5  -> 0.1
//   otherwise  -> 0.2
//
// Stored reports were produced with these buckets, so they are kept as-is.

use serde::{Deserialize, Serialize};

use crate::record::BenchmarkRecord;

const Z_95: f64 = 1.96;

/// Interval around the observed mean difference
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Outcome of the pooled two-sample test for one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceTest {
    /// t statistic (0.0 when degenerate)
    pub statistic: f64,
    /// Bucketed p-value
    pub p_value: f64,
    pub degrees_of_freedom: f64,
    /// p_value < 1 - confidence_level
    pub is_significant: bool,
    /// 95% interval for (current mean - baseline mean)
    pub confidence_interval: ConfidenceInterval,
}

/// Map a t statistic to its bucketed p-value
///
/// # Example
/// ```
/// use benchguard::comparator::p_value_from_statistic;
///
/// assert_eq!(p_value_from_statistic(3.2), 0.001);
/// assert_eq!(p_value_from_statistic(-2.2), 0.05);
/// assert_eq!(p_value_from_statistic(0.4), 0.2);
/// ```
pub fn p_value_from_statistic(statistic: f64) -> f64 {
    let t = statistic.abs();
    if t > 3.0 {
        0.001
    } else if t > 2.5 {
        0.01
    } else if t > 2.0 {
        0.05
    } else if t > 1.5 {
        0.1
    } else {
        0.2
    }
}

/// Run the approximate test on a current/baseline pair's duration means
pub fn significance_test(
    current: &BenchmarkRecord,
    baseline: &BenchmarkRecord,
    confidence_level: f64,
) -> SignificanceTest {
    let n1 = current.iterations as f64;
    let n2 = baseline.iterations as f64;
    let difference = current.duration.mean - baseline.duration.mean;
    let degrees_of_freedom = (n1 + n2 - 2.0).max(0.0);

    let standard_error = if n1 >= 2.0 && n2 >= 2.0 {
        let pooled_variance = ((n1 - 1.0) * current.duration.stddev.powi(2)
            + (n2 - 1.0) * baseline.duration.stddev.powi(2))
            / degrees_of_freedom;
        pooled_variance.sqrt() * (1.0 / n1 + 1.0 / n2).sqrt()
    } else {
        0.0
    };

    let statistic = if standard_error > 0.0 && standard_error.is_finite() {
        difference / standard_error
    } else {
        0.0
    };
    let p_value = p_value_from_statistic(statistic);

    SignificanceTest {
        statistic,
        p_value,
        degrees_of_freedom,
        is_significant: p_value < 1.0 - confidence_level,
        confidence_interval: ConfidenceInterval {
            lower: difference - Z_95 * standard_error,
            upper: difference + Z_95 * standard_error,
        },
    }
}
