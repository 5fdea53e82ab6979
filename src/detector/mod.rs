// Regression detection on top of baseline comparison
//
// A detection run:
// 1. Loads the baseline (a failure leaves history untouched)
// 2. Appends every current record to its test's bounded history window
// 3. Compares current against baseline
// 4. Escalates each metric regression into a severity-classified alert
//    with impact, root-cause and false-positive annotations
// 5. Fits trends over the history of the compared tests
// 6. Scores run health, builds recommendations and emits alert events
//
// Per-test analysis failures skip the test and are recorded as warnings;
// only baseline and configuration errors fail the run.

mod classify;
mod config;
mod false_positive;
mod health;
mod history;
mod recommendations;
mod report;
mod trend;

pub use classify::{
    analyze_root_cause, assess_impact, build_alerts, classify_severity, AlertSeverity,
    AnalysisError, CauseKind, RegressionAlert, RegressionFinding, RegressionImpact,
    RootCauseAnalysis, SkippedTest, SuspectedCause, TimeToFix,
};
pub use config::{
    DetectionConfig, DetectionConfigOverrides, FilteringConfig, FilteringOverrides,
    MetricThresholdOverrides, MetricThresholds, SeverityThresholdOverrides, SeverityThresholds,
    StableSlopeOverrides, StableSlopes, StatisticalConfig, StatisticalOverrides, TrendConfig,
    TrendOverrides, MAX_FORECAST_HORIZON,
};
pub use false_positive::{
    analyze_false_positive, false_positive_signals, FalsePositive, FalsePositiveReason,
    FalsePositiveSignal,
};
pub use health::{summarize_health, ActionUrgency, RegressionSummary, RiskLevel, HEALTH_ALERT_THRESHOLD};
pub use history::{history_stability, HistoryStore, InMemoryHistory};
pub use recommendations::{generate_recommendations, Priority, Recommendation, RecommendationCategory};
pub use report::RegressionDetectionResult;
pub use trend::{
    analyze_metric_trend, analyze_trends, pooled_series, PerformanceTrend, ThresholdProjection,
    TrendDirection, TRENDED_METRICS,
};

use crate::baseline::BaselineSource;
use crate::comparator::Comparator;
use crate::error::{ConfigError, Result};
use crate::events::{AlertEvent, Event, Notifier};
use crate::record::{now_millis, BenchmarkRecord};

/// Detects regressions and trends across successive benchmark runs
///
/// The detector owns its history store; `detect` takes `&mut self`, so runs
/// against one detector are serialized.
///
/// # Example
/// ```
/// use benchguard::baseline::BaselineSource;
/// use benchguard::detector::{AlertSeverity, DetectionConfig, Detector};
/// use benchguard::record::BenchmarkRecord;
///
/// let baseline = BaselineSource::from(vec![
///     BenchmarkRecord::new("api", "login", 10, 100.0).with_heap_used(1000.0),
/// ]);
/// let current = vec![BenchmarkRecord::new("api", "login", 10, 100.0).with_heap_used(2000.0)];
///
/// let mut detector = Detector::new(DetectionConfig::default()).unwrap();
/// let result = detector.detect(&current, &baseline, 5.0).unwrap();
///
/// assert_eq!(result.critical_regressions.len(), 1);
/// assert!(result.has_alerts_at_or_above(AlertSeverity::Critical));
/// ```
#[derive(Debug)]
pub struct Detector<H: HistoryStore = InMemoryHistory> {
    config: DetectionConfig,
    history: H,
    notifier: Notifier,
}

impl Detector<InMemoryHistory> {
    /// Detector with an empty in-memory history
    pub fn new(config: DetectionConfig) -> std::result::Result<Self, ConfigError> {
        Self::with_history(config, InMemoryHistory::default())
    }
}

impl Default for Detector<InMemoryHistory> {
    fn default() -> Self {
        Self {
            config: DetectionConfig::default(),
            history: InMemoryHistory::default(),
            notifier: Notifier::silent(),
        }
    }
}

impl<H: HistoryStore> Detector<H> {
    /// Detector backed by `history`
    pub fn with_history(config: DetectionConfig, history: H) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            history,
            notifier: Notifier::silent(),
        })
    }

    /// Send progress and alert events to `notifier`
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn into_history(self) -> H {
        self.history
    }

    /// Run detection for `current` against the baseline in `source`
    ///
    /// `threshold` is the comparator's regression threshold in percent.
    pub fn detect(
        &mut self,
        current: &[BenchmarkRecord],
        source: &BaselineSource,
        threshold: f64,
    ) -> Result<RegressionDetectionResult> {
        let comparison_config = self.config.comparison_config(threshold);
        comparison_config.validate()?;

        let baseline = source.load()?;

        let capacity = self.config.statistical.trend_analysis_window;
        for record in current {
            self.history.record(&record.key(), record.clone(), capacity);
        }

        let mut comparison = Comparator::new(comparison_config)
            .with_notifier(self.notifier.clone())
            .compare_records(current, &baseline);

        let (alerts, errors) = build_alerts(&comparison, &self.config);
        let warnings: Vec<SkippedTest> = errors
            .iter()
            .map(|err| {
                tracing::warn!("Skipping {}: {}", err.test_key(), err);
                SkippedTest::from(err)
            })
            .collect();
        // Skipped tests leave the result entirely, counts included
        let skipped: Vec<&str> = warnings.iter().map(|w| w.test_key.as_str()).collect();
        comparison.remove_tests(&skipped);

        let false_positives: Vec<FalsePositive> = alerts
            .iter()
            .filter_map(|alert| {
                let test = comparison
                    .comparisons
                    .iter()
                    .find(|c| c.test_key == alert.test_key)?;
                let window = self.history.window(&alert.test_key);
                analyze_false_positive(alert, &test.current, &window, &self.config)
            })
            .collect();

        let windows: Vec<Vec<&BenchmarkRecord>> = comparison
            .comparisons
            .iter()
            .map(|c| self.history.window(&c.test_key))
            .collect();
        let trends = analyze_trends(&windows, &self.config);

        let mut critical = Vec::new();
        let mut major = Vec::new();
        let mut minor = Vec::new();
        for alert in alerts {
            match alert.severity {
                AlertSeverity::Critical => critical.push(alert),
                AlertSeverity::Major => major.push(alert),
                AlertSeverity::Minor => minor.push(alert),
            }
        }

        let total_tests = comparison.summary.total_tests;
        let summary = summarize_health(critical.len(), major.len(), minor.len(), total_tests);
        let recommendations = generate_recommendations(&critical, &minor, &comparison, &trends);

        let result = RegressionDetectionResult {
            timestamp: now_millis(),
            total_tests,
            regressions_detected: summary.total_alerts,
            critical_regressions: critical,
            major_regressions: major,
            minor_regressions: minor,
            false_positives,
            trends,
            summary,
            recommendations,
            warnings,
            comparison,
        };

        self.emit_alerts(&result);

        tracing::info!(
            "Detection over {} tests: {} critical, {} major, {} minor; health {:.0}/100 ({} risk)",
            result.total_tests,
            result.critical_regressions.len(),
            result.major_regressions.len(),
            result.minor_regressions.len(),
            result.summary.health_score,
            result.summary.risk_level
        );

        Ok(result)
    }

    fn emit_alerts(&self, result: &RegressionDetectionResult) {
        for severity in [AlertSeverity::Critical, AlertSeverity::Major, AlertSeverity::Minor] {
            let alerts = result.alerts_at(severity);
            if alerts.is_empty() {
                continue;
            }
            self.notifier.notify(Event::Alert(AlertEvent {
                severity,
                count: alerts.len(),
                alerts: alerts.iter().map(RegressionAlert::label).collect(),
            }));
        }

        if result.summary.is_degraded() {
            self.notifier.notify(Event::HealthDegraded {
                health_score: result.summary.health_score,
            });
        }
    }
}

#[cfg(test)]
mod tests;
