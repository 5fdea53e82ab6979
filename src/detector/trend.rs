// Trend analysis over the historical windows
//
// For duration, memory and CPU the windows of all compared tests are pooled
// into one series anchored on the current mean and chained back through the
// average run-to-run change. A least-squares line through that series gives
// direction, risk and (for degrading trends) the days until each severity
// threshold would be crossed.

use serde::{Deserialize, Serialize};

use super::config::{DetectionConfig, SeverityThresholds};
use super::health::RiskLevel;
use crate::analyzer::{backtest, detect_seasonality, forecast, mean, Forecast, ForecastAccuracy, Seasonality};
use crate::record::{BenchmarkRecord, MetricKind};

/// Series shorter than this get no back-tested accuracy
const MIN_BACKTEST_POINTS: usize = 5;

/// Metrics with trend analysis
pub const TRENDED_METRICS: [MetricKind; 3] = [MetricKind::Duration, MetricKind::Memory, MetricKind::Cpu];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Stable,
    Degrading,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Stable => "stable",
            TrendDirection::Degrading => "degrading",
        };
        f.write_str(name)
    }
}

/// Days until a degrading trend crosses each severity threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProjection {
    pub days_to_minor: f64,
    pub days_to_major: f64,
    pub days_to_critical: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTrend {
    pub metric: MetricKind,
    pub direction: TrendDirection,
    /// Change per run
    pub slope: f64,
    pub intercept: f64,
    pub correlation: f64,
    pub data_points: usize,
    /// Tests pooled into the series
    pub tests: usize,
    pub projection: Option<ThresholdProjection>,
    pub business_risk: RiskLevel,
    pub technical_risk: RiskLevel,
    pub seasonality: Seasonality,
    pub forecast: Forecast,
    pub accuracy: Option<ForecastAccuracy>,
}

/// Pooled `metric` series, windows aligned on their latest run
///
/// The latest position is the mean over every window. Earlier positions are
/// chained backwards by the mean run-to-run change of the windows that cover
/// both runs, so a test joining the history mid-way moves the level of the
/// series without adding a step to it.
///
/// # Example
/// ```
/// use benchguard::detector::pooled_series;
/// use benchguard::record::{BenchmarkRecord, MetricKind};
///
/// let a: Vec<BenchmarkRecord> = [10.0, 20.0, 30.0].iter().map(|&m| BenchmarkRecord::new("s", "a", 5, m)).collect();
/// let b: Vec<BenchmarkRecord> = [40.0, 50.0].iter().map(|&m| BenchmarkRecord::new("s", "b", 5, m)).collect();
/// let windows = vec![a.iter().collect(), b.iter().collect()];
///
/// assert_eq!(pooled_series(&windows, MetricKind::Duration), vec![20.0, 30.0, 40.0]);
/// ```
pub fn pooled_series(windows: &[Vec<&BenchmarkRecord>], metric: MetricKind) -> Vec<f64> {
    let longest = windows.iter().map(Vec::len).max().unwrap_or(0);
    if longest == 0 {
        return Vec::new();
    }

    // Value of `window` at aligned `position`, if the window reaches back that far
    let at = |window: &Vec<&BenchmarkRecord>, position: usize| {
        position
            .checked_sub(longest - window.len())
            .map(|i| window[i].metric(metric))
    };

    let latest: Vec<f64> = windows
        .iter()
        .filter_map(|window| window.last().map(|record| record.metric(metric)))
        .collect();

    let mut series = vec![0.0; longest];
    series[longest - 1] = mean(&latest);
    for position in (1..longest).rev() {
        let steps: Vec<f64> = windows
            .iter()
            .filter_map(|window| Some(at(window, position)? - at(window, position - 1)?))
            .collect();
        series[position - 1] = series[position] - mean(&steps);
    }
    series
}

fn stable_slope(config: &DetectionConfig, metric: MetricKind) -> f64 {
    let slopes = &config.trend.stable_slope;
    match metric {
        MetricKind::Memory => slopes.memory,
        MetricKind::Cpu => slopes.cpu,
        MetricKind::Duration | MetricKind::P95Duration | MetricKind::P99Duration => slopes.duration,
    }
}

fn business_risk(slope: f64, stable: f64) -> RiskLevel {
    let ratio = if stable > 0.0 {
        slope.abs() / stable
    } else if slope == 0.0 {
        0.0
    } else {
        f64::INFINITY
    };
    if ratio > 10.0 {
        RiskLevel::High
    } else if ratio > 3.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn technical_risk(correlation: f64) -> RiskLevel {
    let strength = correlation.abs();
    if strength > 0.8 {
        RiskLevel::High
    } else if strength > 0.5 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn project(intercept: f64, slope: f64, thresholds: &SeverityThresholds, runs_per_day: f64) -> ThresholdProjection {
    let days = |percent: f64| intercept * (percent / 100.0) / slope / runs_per_day;
    ThresholdProjection {
        days_to_minor: days(thresholds.minor),
        days_to_major: days(thresholds.major),
        days_to_critical: days(thresholds.critical),
    }
}

/// Trend of one metric over a pooled series
///
/// Returns `None` for series with fewer than two points.
pub fn analyze_metric_trend(
    metric: MetricKind,
    series: &[f64],
    tests: usize,
    config: &DetectionConfig,
) -> Option<PerformanceTrend> {
    if series.len() < 2 {
        return None;
    }

    let projected = forecast(series, config.trend.forecast_horizon);
    let line = projected.trend;
    let stable = stable_slope(config, metric);

    let direction = if line.slope.abs() < stable {
        TrendDirection::Stable
    } else if line.slope > 0.0 {
        TrendDirection::Degrading
    } else {
        TrendDirection::Improving
    };

    let (projection, business, technical) = if direction == TrendDirection::Degrading {
        let projection = match config.thresholds.get(metric) {
            Some(thresholds) if line.intercept > 0.0 => Some(project(
                line.intercept,
                line.slope,
                thresholds,
                config.trend.runs_per_day,
            )),
            _ => None,
        };
        (
            projection,
            business_risk(line.slope, stable),
            technical_risk(line.correlation),
        )
    } else {
        (None, RiskLevel::Low, RiskLevel::Low)
    };

    let accuracy = if series.len() >= MIN_BACKTEST_POINTS {
        backtest(series)
    } else {
        None
    };

    tracing::debug!(
        "{} trend over {} runs: {} (slope {:.3}, r {:.3})",
        metric,
        series.len(),
        direction,
        line.slope,
        line.correlation
    );

    Some(PerformanceTrend {
        metric,
        direction,
        slope: line.slope,
        intercept: line.intercept,
        correlation: line.correlation,
        data_points: series.len(),
        tests,
        projection,
        business_risk: business,
        technical_risk: technical,
        seasonality: detect_seasonality(series, config.trend.seasonality_threshold),
        forecast: projected,
        accuracy,
    })
}

/// Trends for duration, memory and CPU over the given test windows
pub fn analyze_trends(windows: &[Vec<&BenchmarkRecord>], config: &DetectionConfig) -> Vec<PerformanceTrend> {
    let populated = windows.iter().filter(|w| !w.is_empty()).count();
    TRENDED_METRICS
        .iter()
        .filter_map(|&metric| {
            let series = pooled_series(windows, metric);
            analyze_metric_trend(metric, &series, populated, config)
        })
        .collect()
}
