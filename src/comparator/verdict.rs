// Overall verdict for one compared test
//
// Rules, first match wins:
// 1. Any metric with critical significance: regression or improvement by the
//    direction most critical metrics moved (ties count as regression),
//    severity critical
// 2. Regressions and improvements both present: mixed
// 3. Only regressions: regression, severity = worst regressed metric
// 4. Only improvements: improvement, severity low
// 5. Otherwise neutral

use serde::{Deserialize, Serialize};

use super::metrics::{ChangeSignificance, MetricComparison};
use super::significance::SignificanceTest;
use crate::record::MetricKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonStatus {
    Regression,
    Improvement,
    Mixed,
    Neutral,
}

impl std::fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ComparisonStatus::Regression => "regression",
            ComparisonStatus::Improvement => "improvement",
            ComparisonStatus::Mixed => "mixed",
            ComparisonStatus::Neutral => "neutral",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallComparison {
    pub status: ComparisonStatus,
    pub severity: ChangeSignificance,
    /// 1 - p of the significance test
    pub confidence: f64,
    /// Largest regression (or change, when nothing regressed)
    pub primary_concern: Option<String>,
    /// Weighted mean of |change| / 100 across metrics, in [0, 1]
    pub impact_score: f64,
}

/// Weight of a metric in the impact score
pub fn impact_weight(metric: MetricKind) -> f64 {
    match metric {
        MetricKind::Duration => 0.4,
        MetricKind::P95Duration => 0.3,
        MetricKind::P99Duration => 0.2,
        MetricKind::Memory => 0.1,
        MetricKind::Cpu => 0.1,
    }
}

/// Weighted impact score in [0, 1]
pub fn impact_score(metrics: &[MetricComparison]) -> f64 {
    let total_weight: f64 = metrics.iter().map(|m| impact_weight(m.metric)).sum();
    if total_weight == 0.0 {
        return 0.0;
    }
    let weighted: f64 = metrics
        .iter()
        .map(|m| impact_weight(m.metric) * m.percentage_change.abs() / 100.0)
        .sum();
    (weighted / total_weight).clamp(0.0, 1.0)
}

fn describe_change(metric: &MetricComparison) -> String {
    let direction = if metric.percentage_change >= 0.0 {
        "increased"
    } else {
        "decreased"
    };
    format!(
        "{} {} by {:.1}%",
        metric.metric,
        direction,
        metric.percentage_change.abs()
    )
}

fn largest_change<'a>(metrics: impl Iterator<Item = &'a MetricComparison>) -> Option<&'a MetricComparison> {
    metrics.max_by(|a, b| {
        a.percentage_change
            .abs()
            .total_cmp(&b.percentage_change.abs())
    })
}

/// Derive the overall verdict for a test from its metric comparisons
pub fn overall_verdict(metrics: &[MetricComparison], test: &SignificanceTest) -> OverallComparison {
    let regressions: Vec<&MetricComparison> = metrics.iter().filter(|m| m.is_regression).collect();
    let improvements: Vec<&MetricComparison> =
        metrics.iter().filter(|m| m.is_improvement).collect();
    let critical: Vec<&MetricComparison> = metrics
        .iter()
        .filter(|m| m.significance == ChangeSignificance::Critical)
        .collect();

    let (status, severity) = if !critical.is_empty() {
        let worse = critical.iter().filter(|m| m.percentage_change > 0.0).count();
        let better = critical.len() - worse;
        let status = if worse >= better {
            ComparisonStatus::Regression
        } else {
            ComparisonStatus::Improvement
        };
        (status, ChangeSignificance::Critical)
    } else if !regressions.is_empty() && !improvements.is_empty() {
        let worst = regressions
            .iter()
            .map(|m| m.significance)
            .max()
            .unwrap_or(ChangeSignificance::Low);
        (ComparisonStatus::Mixed, worst)
    } else if !regressions.is_empty() {
        let worst = regressions
            .iter()
            .map(|m| m.significance)
            .max()
            .unwrap_or(ChangeSignificance::Low);
        (ComparisonStatus::Regression, worst)
    } else if !improvements.is_empty() {
        (ComparisonStatus::Improvement, ChangeSignificance::Low)
    } else {
        (ComparisonStatus::Neutral, ChangeSignificance::Low)
    };

    let concern = largest_change(regressions.iter().copied())
        .or_else(|| largest_change(improvements.iter().copied()))
        .or_else(|| largest_change(critical.iter().copied()))
        .map(describe_change);

    OverallComparison {
        status,
        severity,
        confidence: 1.0 - test.p_value,
        primary_concern: concern,
        impact_score: impact_score(metrics),
    }
}
