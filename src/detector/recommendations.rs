// Rule-based recommendations, one block per triggered condition

use serde::{Deserialize, Serialize};

use super::classify::RegressionAlert;
use super::trend::{PerformanceTrend, TrendDirection};
use crate::comparator::ComparisonResult;

/// Improvements beyond this (percent) are suspicious enough to validate
const LARGE_IMPROVEMENT: f64 = -25.0;

/// More minor alerts than this point at a process problem
const MANY_MINOR_ALERTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Performance,
    Validation,
    Monitoring,
    Process,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: RecommendationCategory,
    pub title: String,
    pub description: String,
    pub action_items: Vec<String>,
    pub estimated_effort: String,
    pub timeframe: String,
    pub success_criteria: Vec<String>,
}

fn critical_block(critical: &[RegressionAlert]) -> Recommendation {
    let mut action_items: Vec<String> = critical
        .iter()
        .map(|a| {
            format!(
                "Fix {} ({} +{:.1}%): {}",
                a.test_key,
                a.metric,
                a.percentage_change,
                a.root_cause
                    .primary()
                    .map(|c| c.description.as_str())
                    .unwrap_or("cause unknown")
            )
        })
        .collect();
    action_items.push("Block the release until the regressions are resolved".to_string());
    action_items.push("Bisect recent commits touching the affected code paths".to_string());

    Recommendation {
        priority: Priority::Critical,
        category: RecommendationCategory::Performance,
        title: format!("Resolve {} critical performance regression(s)", critical.len()),
        description: "Critical regressions exceed configured thresholds and will be felt in production"
            .to_string(),
        action_items,
        estimated_effort: format!("{}-{} hours", critical.len() * 2, critical.len() * 8),
        timeframe: "within 24 hours".to_string(),
        success_criteria: vec![
            "No critical alerts on the next detection run".to_string(),
            "Affected metrics back within the minor threshold of baseline".to_string(),
        ],
    }
}

fn improvement_block(improvements: &[String]) -> Recommendation {
    Recommendation {
        priority: Priority::Medium,
        category: RecommendationCategory::Validation,
        title: format!("Validate {} large improvement(s)", improvements.len()),
        description: "Improvements above 25% are often measurement artifacts or skipped work".to_string(),
        action_items: improvements
            .iter()
            .map(|i| format!("Confirm {} still does the same work", i))
            .chain(std::iter::once(
                "Update the baseline once the improvement is confirmed".to_string(),
            ))
            .collect(),
        estimated_effort: "1-2 hours".to_string(),
        timeframe: "within 1 week".to_string(),
        success_criteria: vec![
            "Improvement reproduces across repeated runs".to_string(),
            "Test output unchanged".to_string(),
        ],
    }
}

fn trend_block(degrading: &[&PerformanceTrend]) -> Recommendation {
    let action_items = degrading
        .iter()
        .map(|t| match &t.projection {
            Some(p) => format!(
                "{} degrading by {:.3} per run; minor threshold in {:.1} days",
                t.metric, t.slope, p.days_to_minor
            ),
            None => format!("{} degrading by {:.3} per run", t.metric, t.slope),
        })
        .chain(std::iter::once(
            "Profile the slowest-growing tests before the trend crosses a threshold".to_string(),
        ))
        .collect();

    Recommendation {
        priority: Priority::High,
        category: RecommendationCategory::Monitoring,
        title: format!("Address {} degrading performance trend(s)", degrading.len()),
        description: "Metrics are drifting upward across recent runs even where no single run regressed"
            .to_string(),
        action_items,
        estimated_effort: "4-8 hours".to_string(),
        timeframe: "within 2 weeks".to_string(),
        success_criteria: vec!["Trend direction stable or improving over the next window".to_string()],
    }
}

fn process_block(minor: usize) -> Recommendation {
    Recommendation {
        priority: Priority::Low,
        category: RecommendationCategory::Process,
        title: format!("Review process around {} minor regressions", minor),
        description: "Many small regressions usually mean performance is not checked before merge"
            .to_string(),
        action_items: vec![
            "Run benchmarks in CI on every pull request".to_string(),
            "Add performance budgets to code review".to_string(),
            "Group minor regressions by owner and schedule cleanup".to_string(),
        ],
        estimated_effort: "1-2 days".to_string(),
        timeframe: "next sprint".to_string(),
        success_criteria: vec![format!(
            "At most {} minor alerts per run",
            MANY_MINOR_ALERTS
        )],
    }
}

/// Recommendations for a detection run, most urgent first
pub fn generate_recommendations(
    critical: &[RegressionAlert],
    minor: &[RegressionAlert],
    comparison: &ComparisonResult,
    trends: &[PerformanceTrend],
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if !critical.is_empty() {
        recommendations.push(critical_block(critical));
    }

    let degrading: Vec<&PerformanceTrend> = trends
        .iter()
        .filter(|t| t.direction == TrendDirection::Degrading)
        .collect();
    if !degrading.is_empty() {
        recommendations.push(trend_block(&degrading));
    }

    let large_improvements: Vec<String> = comparison
        .comparisons
        .iter()
        .flat_map(|c| {
            c.improvements()
                .filter(|m| m.percentage_change < LARGE_IMPROVEMENT)
                .map(move |m| format!("{} ({} {:.1}%)", c.test_key, m.metric, m.percentage_change))
        })
        .collect();
    if !large_improvements.is_empty() {
        recommendations.push(improvement_block(&large_improvements));
    }

    if minor.len() > MANY_MINOR_ALERTS {
        recommendations.push(process_block(minor.len()));
    }

    recommendations
}
