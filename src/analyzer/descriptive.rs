// Descriptive statistics over f64 samples
//
// Moments are computed with trueno SIMD vectors in f32 lanes, so results carry
// single-precision rounding (about 1e-7 relative). All moments are population
// moments (divide by n). Every function accepts an empty slice and returns 0.0
// for it.

use serde::{Deserialize, Serialize};
use trueno::Vector;

use super::normality::{check_normality, NormalityCheck};
use super::outliers::{detect_outliers, OutlierReport};

fn to_vector(values: &[f64]) -> Vector<f32> {
    let lanes: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    Vector::from_slice(&lanes)
}

/// Deviations from the mean, exactly zero for a constant sample
///
/// Second moments are taken over these instead of `E[x^2] - mean^2`, which
/// cancels badly in f32 for large, tightly clustered values.
pub(crate) fn deviations(values: &[f64]) -> Vector<f32> {
    let v = to_vector(values);
    let (Ok(min), Ok(max), Ok(m)) = (v.min(), v.max(), v.mean()) else {
        return v;
    };
    if min == max {
        return Vector::from_slice(&vec![0.0f32; values.len()]);
    }
    let centered: Vec<f32> = v.as_slice().iter().map(|x| x - m).collect();
    Vector::from_slice(&centered)
}

/// Sum of squared deviations from the mean
pub(crate) fn sum_of_squared_deviations(values: &[f64]) -> f64 {
    f64::from(deviations(values).sum_of_squares().unwrap_or(0.0))
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> f64 {
    f64::from(to_vector(values).mean().unwrap_or(0.0))
}

/// Population variance
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    sum_of_squared_deviations(values) / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Mean of `((x - mean) / stddev)^order`; 0.0 for constant or empty input
fn standardized_moment(values: &[f64], order: i32) -> f64 {
    let sd = std_dev(values) as f32;
    if sd == 0.0 {
        return 0.0;
    }
    let powers: Vec<f32> = deviations(values)
        .as_slice()
        .iter()
        .map(|d| (d / sd).powi(order))
        .collect();
    f64::from(Vector::from_slice(&powers).mean().unwrap_or(0.0))
}

/// Population skewness (third standardized moment)
///
/// Returns 0.0 for constant or empty input.
pub fn skewness(values: &[f64]) -> f64 {
    standardized_moment(values, 3)
}

/// Population excess kurtosis (fourth standardized moment minus 3)
///
/// A normal distribution scores 0.0. Constant or empty input also returns 0.0.
pub fn kurtosis(values: &[f64]) -> f64 {
    if std_dev(values) == 0.0 {
        return 0.0;
    }
    standardized_moment(values, 4) - 3.0
}

/// Nearest-rank percentile on a sorted copy of `values`
///
/// `index = ceil(p/100 * n) - 1`, clamped to `[0, n-1]`.
///
/// # Example
/// ```
/// use benchguard::analyzer::percentile;
///
/// let values = [15.0, 20.0, 35.0, 40.0, 50.0];
/// assert_eq!(percentile(&values, 30.0), 20.0);
/// assert_eq!(percentile(&values, 100.0), 50.0);
/// assert_eq!(percentile(&[], 50.0), 0.0);
/// ```
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    nearest_rank(&sorted, p)
}

pub(crate) fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let rank = (p / 100.0 * n as f64).ceil() as i64 - 1;
    let index = rank.clamp(0, n as i64 - 1) as usize;
    sorted[index]
}

pub(crate) fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Median (mean of the two middle values for even lengths)
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// `stddev / |mean|`, 0.0 when the mean is (near) zero
///
/// The single definition of dispersion used for records, samples and history.
///
/// # Example
/// ```
/// use benchguard::analyzer::variation_ratio;
///
/// assert_eq!(variation_ratio(2.5, 10.0), 0.25);
/// assert_eq!(variation_ratio(2.5, 0.0), 0.0);
/// ```
pub fn variation_ratio(stddev: f64, mean: f64) -> f64 {
    if mean.abs() < f64::EPSILON {
        return 0.0;
    }
    stddev / mean.abs()
}

/// Coefficient of variation of a sample
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    variation_ratio(std_dev(values), mean(values))
}

/// Everything worth knowing about a sample in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub coefficient_of_variation: f64,
    pub outliers: OutlierReport,
    pub normality: NormalityCheck,
}

/// Summarize a sample
pub fn summarize(values: &[f64]) -> StatisticalSummary {
    let sorted = sorted_copy(values);

    StatisticalSummary {
        count: values.len(),
        mean: mean(values),
        median: median(values),
        std_dev: std_dev(values),
        variance: variance(values),
        min: sorted.first().copied().unwrap_or(0.0),
        max: sorted.last().copied().unwrap_or(0.0),
        p25: nearest_rank(&sorted, 25.0),
        p75: nearest_rank(&sorted, 75.0),
        p90: nearest_rank(&sorted, 90.0),
        p95: nearest_rank(&sorted, 95.0),
        p99: nearest_rank(&sorted, 99.0),
        skewness: skewness(values),
        kurtosis: kurtosis(values),
        coefficient_of_variation: coefficient_of_variation(values),
        outliers: detect_outliers(values),
        normality: check_normality(values),
    }
}
