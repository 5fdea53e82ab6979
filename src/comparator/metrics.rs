// Per-metric comparison between a current record and its baseline

use serde::{Deserialize, Serialize};

use super::config::ComparisonConfig;
use crate::record::{BenchmarkRecord, MetricKind};

/// Significance bucket for a change, by |percentage change|
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSignificance {
    /// <= 10%
    Low,
    /// > 10%
    Medium,
    /// > 25%
    High,
    /// > 50%
    Critical,
}

impl ChangeSignificance {
    pub fn from_percentage_change(percentage_change: f64) -> Self {
        let magnitude = percentage_change.abs();
        if magnitude > 50.0 {
            ChangeSignificance::Critical
        } else if magnitude > 25.0 {
            ChangeSignificance::High
        } else if magnitude > 10.0 {
            ChangeSignificance::Medium
        } else {
            ChangeSignificance::Low
        }
    }
}

impl std::fmt::Display for ChangeSignificance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChangeSignificance::Low => "low",
            ChangeSignificance::Medium => "medium",
            ChangeSignificance::High => "high",
            ChangeSignificance::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// How one metric moved between baseline and current
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: MetricKind,
    pub current_value: f64,
    pub baseline_value: f64,
    pub absolute_change: f64,
    /// Change relative to baseline in percent; 0.0 when the baseline is 0
    pub percentage_change: f64,
    pub is_regression: bool,
    pub is_improvement: bool,
    pub significance: ChangeSignificance,
    /// 1 - p of the pair's significance test
    pub confidence_level: f64,
}

/// Percentage change from `baseline` to `current`
///
/// # Example
/// ```
/// use benchguard::comparator::percentage_change;
///
/// assert_eq!(percentage_change(120.0, 100.0), 20.0);
/// assert_eq!(percentage_change(5.0, 0.0), 0.0);
/// ```
pub fn percentage_change(current: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    (current - baseline) / baseline * 100.0
}

/// Compare one metric of a matched pair
pub fn compare_metric(
    metric: MetricKind,
    current: &BenchmarkRecord,
    baseline: &BenchmarkRecord,
    config: &ComparisonConfig,
    confidence_level: f64,
) -> MetricComparison {
    let current_value = current.metric(metric);
    let baseline_value = baseline.metric(metric);
    let change = percentage_change(current_value, baseline_value);

    MetricComparison {
        metric,
        current_value,
        baseline_value,
        absolute_change: current_value - baseline_value,
        percentage_change: change,
        is_regression: change > config.regression_threshold,
        is_improvement: change < config.improvement_threshold,
        significance: ChangeSignificance::from_percentage_change(change),
        confidence_level,
    }
}

/// Compare every tracked metric, in [`MetricKind::ALL`] order
pub fn compare_all_metrics(
    current: &BenchmarkRecord,
    baseline: &BenchmarkRecord,
    config: &ComparisonConfig,
    confidence_level: f64,
) -> Vec<MetricComparison> {
    MetricKind::ALL
        .iter()
        .map(|&metric| compare_metric(metric, current, baseline, config, confidence_level))
        .collect()
}
