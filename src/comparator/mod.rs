// Baseline comparison for benchmark records
//
// Matches current records to baseline records by test key (`suite.test`),
// compares five metrics per pair (mean/p95/p99 duration, heap, CPU), runs an
// approximate significance test on the duration means, and derives a verdict
// per test plus a run-wide summary.
//
// Matching rules:
// - A current record matches the FIRST baseline record with the same key
// - Either side is rejected when it failed (if excluded), ran fewer than
//   `min_iterations`, or its coefficient of variation exceeds
//   `max_variability`
// - Current records without a baseline are dropped from the comparison

mod config;
mod metrics;
mod significance;
mod summary;
mod verdict;

pub use config::ComparisonConfig;
pub use metrics::{
    compare_all_metrics, compare_metric, percentage_change, ChangeSignificance, MetricComparison,
};
pub use significance::{
    p_value_from_statistic, significance_test, ConfidenceInterval, SignificanceTest,
};
pub use summary::{summarize_comparisons, ComparisonSummary};
pub use verdict::{impact_score, impact_weight, overall_verdict, ComparisonStatus, OverallComparison};

use crate::baseline::{BaselineLoadError, BaselineSource};
use crate::events::{Event, Notifier, ProgressEvent};
use crate::record::{now_millis, BenchmarkRecord};
use serde::{Deserialize, Serialize};

/// One matched current/baseline pair and how it compares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestComparison {
    pub test_key: String,
    pub current: BenchmarkRecord,
    pub baseline: BenchmarkRecord,
    /// One entry per compared metric; never empty for a matched pair
    pub metrics: Vec<MetricComparison>,
    pub overall: OverallComparison,
    pub significance: SignificanceTest,
}

impl TestComparison {
    pub fn regressions(&self) -> impl Iterator<Item = &MetricComparison> {
        self.metrics.iter().filter(|m| m.is_regression)
    }

    pub fn improvements(&self) -> impl Iterator<Item = &MetricComparison> {
        self.metrics.iter().filter(|m| m.is_improvement)
    }
}

/// Why a record was kept out of the comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    Failed,
    InsufficientIterations { iterations: u64, required: u64 },
    Unstable { coefficient_of_variation: f64, max_variability: f64 },
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::Failed => write!(f, "run failed"),
            ExclusionReason::InsufficientIterations {
                iterations,
                required,
            } => write!(f, "{} iterations < {} required", iterations, required),
            ExclusionReason::Unstable {
                coefficient_of_variation,
                max_variability,
            } => write!(
                f,
                "coefficient of variation {:.2} > {:.2}",
                coefficient_of_variation, max_variability
            ),
        }
    }
}

/// Which side of the pair was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSide {
    Current,
    Baseline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedTest {
    pub test_key: String,
    pub side: RecordSide,
    pub reason: ExclusionReason,
}

/// Everything one comparison run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub regression_threshold: f64,
    pub improvement_threshold: f64,
    pub comparisons: Vec<TestComparison>,
    pub summary: ComparisonSummary,
    /// Pairs rejected by the matching filters
    pub excluded: Vec<ExcludedTest>,
    /// Current test keys with no baseline record
    pub unmatched: Vec<String>,
}

impl ComparisonResult {
    /// Drop the comparisons of `keys` and summarize what is left
    pub fn remove_tests(&mut self, keys: &[&str]) {
        if keys.is_empty() {
            return;
        }
        self.comparisons.retain(|c| !keys.contains(&c.test_key.as_str()));
        self.summary = summarize_comparisons(&self.comparisons);
    }
}

/// Compares current benchmark records against a baseline
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    config: ComparisonConfig,
    notifier: Notifier,
}

impl Comparator {
    pub fn new(config: ComparisonConfig) -> Self {
        Self {
            config,
            notifier: Notifier::silent(),
        }
    }

    /// Send progress events to `notifier`
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Load the baseline from `source` and compare `current` against it
    ///
    /// `threshold` overrides the configured thresholds: regressions above
    /// `threshold` percent, improvements below `-threshold` percent.
    ///
    /// # Example
    /// ```
    /// use benchguard::baseline::BaselineSource;
    /// use benchguard::comparator::{Comparator, ComparisonStatus};
    /// use benchguard::record::BenchmarkRecord;
    ///
    /// let baseline = vec![BenchmarkRecord::new("api", "login", 10, 100.0)];
    /// let current = vec![BenchmarkRecord::new("api", "login", 10, 120.0)];
    ///
    /// let result = Comparator::default()
    ///     .compare(&current, &BaselineSource::from(baseline), 5.0)
    ///     .unwrap();
    /// assert_eq!(result.comparisons[0].overall.status, ComparisonStatus::Regression);
    /// ```
    pub fn compare(
        &self,
        current: &[BenchmarkRecord],
        source: &BaselineSource,
        threshold: f64,
    ) -> Result<ComparisonResult, BaselineLoadError> {
        let baseline = source.load()?;
        let config = self.config.clone().with_threshold(threshold);
        Ok(compare_with(&config, current, &baseline, &self.notifier))
    }

    /// Compare against already-loaded baseline records with the configured thresholds
    pub fn compare_records(
        &self,
        current: &[BenchmarkRecord],
        baseline: &[BenchmarkRecord],
    ) -> ComparisonResult {
        compare_with(&self.config, current, baseline, &self.notifier)
    }
}

/// Reason `record` must not take part in a comparison, if any
pub fn exclusion_reason(record: &BenchmarkRecord, config: &ComparisonConfig) -> Option<ExclusionReason> {
    if config.exclude_failed_tests && !record.success {
        return Some(ExclusionReason::Failed);
    }
    if record.iterations < config.min_iterations {
        return Some(ExclusionReason::InsufficientIterations {
            iterations: record.iterations,
            required: config.min_iterations,
        });
    }
    let cv = record.coefficient_of_variation();
    if cv > config.max_variability {
        return Some(ExclusionReason::Unstable {
            coefficient_of_variation: cv,
            max_variability: config.max_variability,
        });
    }
    None
}

fn compare_with(
    config: &ComparisonConfig,
    current: &[BenchmarkRecord],
    baseline: &[BenchmarkRecord],
    notifier: &Notifier,
) -> ComparisonResult {
    let mut comparisons = Vec::new();
    let mut excluded = Vec::new();
    let mut unmatched = Vec::new();

    for (position, record) in current.iter().enumerate() {
        let key = record.key();

        let Some(base) = baseline.iter().find(|b| b.key() == key) else {
            tracing::debug!("No baseline for {}, skipping", key);
            unmatched.push(key);
            continue;
        };

        let rejection = exclusion_reason(record, config)
            .map(|reason| (RecordSide::Current, reason))
            .or_else(|| exclusion_reason(base, config).map(|reason| (RecordSide::Baseline, reason)));
        if let Some((side, reason)) = rejection {
            tracing::debug!("Excluding {} ({:?} side): {}", key, side, reason);
            excluded.push(ExcludedTest {
                test_key: key,
                side,
                reason,
            });
            continue;
        }

        let significance = significance_test(record, base, config.confidence_level);
        let metrics = compare_all_metrics(record, base, config, 1.0 - significance.p_value);
        let overall = overall_verdict(&metrics, &significance);

        tracing::debug!(
            "Compared {}: {} (severity {}, impact {:.3})",
            key,
            overall.status,
            overall.severity,
            overall.impact_score
        );

        notifier.notify(Event::Progress(ProgressEvent {
            index: position + 1,
            total: current.len(),
            test_key: key.clone(),
        }));

        comparisons.push(TestComparison {
            test_key: key,
            current: record.clone(),
            baseline: base.clone(),
            metrics,
            overall,
            significance,
        });
    }

    let summary = summarize_comparisons(&comparisons);
    tracing::info!(
        "Compared {} tests: {} regressions, {} improvements, {} mixed ({} excluded, {} unmatched)",
        summary.total_tests,
        summary.regressions,
        summary.improvements,
        summary.mixed,
        excluded.len(),
        unmatched.len()
    );

    ComparisonResult {
        timestamp: now_millis(),
        regression_threshold: config.regression_threshold,
        improvement_threshold: config.improvement_threshold,
        comparisons,
        summary,
        excluded,
        unmatched,
    }
}

#[cfg(test)]
mod tests;
