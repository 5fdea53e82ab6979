// Aggregate view over all compared tests

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::metrics::ChangeSignificance;
use super::verdict::ComparisonStatus;
use super::TestComparison;
use crate::analyzer::mean;
use crate::record::MetricKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_tests: usize,
    pub regressions: usize,
    pub improvements: usize,
    pub mixed: usize,
    pub neutral: usize,
    /// Mean percentage change per metric across compared tests
    pub average_changes: BTreeMap<MetricKind, f64>,
    pub significant_tests: usize,
    pub critical_tests: usize,
    pub overall_status: ComparisonStatus,
}

/// Summarize a set of test comparisons
///
/// The overall status is regression as soon as one test regressed
/// critically; otherwise the majority direction wins, with equal non-zero
/// counts (or only mixed tests) reported as mixed.
pub fn summarize_comparisons(comparisons: &[TestComparison]) -> ComparisonSummary {
    let count = |status: ComparisonStatus| {
        comparisons
            .iter()
            .filter(|c| c.overall.status == status)
            .count()
    };
    let regressions = count(ComparisonStatus::Regression);
    let improvements = count(ComparisonStatus::Improvement);
    let mixed = count(ComparisonStatus::Mixed);
    let neutral = count(ComparisonStatus::Neutral);

    let mut average_changes = BTreeMap::new();
    for metric in MetricKind::ALL {
        let changes: Vec<f64> = comparisons
            .iter()
            .flat_map(|c| c.metrics.iter())
            .filter(|m| m.metric == metric)
            .map(|m| m.percentage_change)
            .collect();
        if !changes.is_empty() {
            average_changes.insert(metric, mean(&changes));
        }
    }

    let significant_tests = comparisons
        .iter()
        .filter(|c| c.significance.is_significant)
        .count();
    let critical_tests = comparisons
        .iter()
        .filter(|c| c.overall.severity == ChangeSignificance::Critical)
        .count();

    let critical_regression = comparisons.iter().any(|c| {
        c.overall.status == ComparisonStatus::Regression
            && c.overall.severity == ChangeSignificance::Critical
    });

    let overall_status = if critical_regression {
        ComparisonStatus::Regression
    } else if regressions == 0 && improvements == 0 && mixed == 0 {
        ComparisonStatus::Neutral
    } else if regressions > improvements {
        ComparisonStatus::Regression
    } else if improvements > regressions {
        ComparisonStatus::Improvement
    } else {
        ComparisonStatus::Mixed
    };

    ComparisonSummary {
        total_tests: comparisons.len(),
        regressions,
        improvements,
        mixed,
        neutral,
        average_changes,
        significant_tests,
        critical_tests,
        overall_status,
    }
}
