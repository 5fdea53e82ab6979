// Scenario tests for regression detection
//
// Each test drives `Detector::detect` the way CI would: a fixed baseline and
// one or more current runs, then checks alerts, history, trends and events.

use super::*;
use crate::baseline::BaselineLoadError;
use crate::comparator::ExclusionReason;
use crate::error::DetectError;
use crate::record::MetricKind;
use std::sync::{Arc, Mutex};

fn record(suite: &str, test: &str, mean: f64) -> BenchmarkRecord {
    BenchmarkRecord::new(suite, test, 20, mean)
        .with_stddev(mean * 0.02)
        .with_heap_used(1_000_000.0)
        .with_cpu(40.0)
}

fn detector() -> Detector {
    Detector::new(DetectionConfig::default()).unwrap()
}

fn capture_events() -> (Notifier, Arc<Mutex<Vec<Event>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&seen);
    let notifier = Notifier::new(Arc::new(move |event: &Event| {
        captured.lock().unwrap().push(event.clone());
    }));
    (notifier, seen)
}

#[test]
fn test_doubled_memory_is_critical() {
    let baseline = BaselineSource::from(vec![record("alloc", "vec_push", 10.0)]);
    let current = vec![record("alloc", "vec_push", 10.0).with_heap_used(2_000_000.0)];

    let result = detector().detect(&current, &baseline, 5.0).unwrap();

    assert_eq!(result.critical_regressions.len(), 1);
    let alert = &result.critical_regressions[0];
    assert_eq!(alert.metric, MetricKind::Memory);
    assert_eq!(alert.percentage_change, 100.0);
    assert!(!alert.impact.user_facing);
    assert_eq!(alert.impact.affected_users_percent, 20.0);
    assert_eq!(alert.time_to_fix, TimeToFix::Immediate);
    assert!(result.major_regressions.is_empty());
    assert!(result.minor_regressions.is_empty());
    assert_eq!(result.summary.health_score, 70.0);
    assert_eq!(result.summary.risk_level, RiskLevel::Critical);
    assert_eq!(result.summary.action_urgency, ActionUrgency::Immediate);
}

#[test]
fn test_twenty_percent_duration_is_minor() {
    let baseline = BaselineSource::from(vec![record("api", "login", 100.0)]);
    let current = vec![record("api", "login", 120.0)];

    let result = detector().detect(&current, &baseline, 5.0).unwrap();

    let duration = result
        .minor_regressions
        .iter()
        .find(|a| a.metric == MetricKind::Duration)
        .unwrap();
    assert_eq!(duration.percentage_change, 20.0);
    assert_eq!(duration.significance, crate::comparator::ChangeSignificance::Medium);
    assert!(duration.impact.user_facing);
    assert!(duration.impact.business_impact.starts_with("User-visible"));

    // Tail latency moved with the mean and has no thresholds of its own
    assert_eq!(result.minor_regressions.len(), 3);
    assert_eq!(result.regressions_detected, 3);
    assert!(result.critical_regressions.is_empty());
}

#[test]
fn test_missing_baseline_fails_before_history_update() {
    let dir = tempfile::tempdir().unwrap();
    let source = BaselineSource::file(dir.path().join("missing.json"));
    let mut detector = detector();

    let err = detector
        .detect(&[record("api", "login", 100.0)], &source, 5.0)
        .unwrap_err();

    assert!(matches!(
        err,
        DetectError::Baseline(BaselineLoadError::NotFound { .. })
    ));
    assert!(detector.history().is_empty());
}

#[test]
fn test_negative_threshold_is_config_error() {
    let baseline = BaselineSource::from(vec![record("api", "login", 100.0)]);
    let mut detector = detector();

    let err = detector
        .detect(&[record("api", "login", 100.0)], &baseline, -1.0)
        .unwrap_err();
    assert!(matches!(err, DetectError::Config(_)));
    assert!(detector.history().is_empty());
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let mut config = DetectionConfig::default();
    config.thresholds.duration.minor = -5.0;
    assert!(Detector::new(config).is_err());
}

#[test]
fn test_sequential_runs_build_degrading_trend() {
    let baseline = BaselineSource::from(vec![record("render", "frame", 100.0)]);
    let mut detector = detector();

    let mut last = None;
    for run in 0..12 {
        let current = vec![record("render", "frame", 100.0 + 5.0 * run as f64)];
        last = Some(detector.detect(&current, &baseline, 5.0).unwrap());
    }
    let result = last.unwrap();

    assert_eq!(detector.history().window("render.frame").len(), 10);

    let duration = result
        .trends
        .iter()
        .find(|t| t.metric == MetricKind::Duration)
        .unwrap();
    assert_eq!(duration.direction, TrendDirection::Degrading);
    assert!(duration.correlation > 0.9);
    assert!((duration.slope - 5.0).abs() < 1e-6);
    assert_eq!(duration.data_points, 10);
    assert!(duration.projection.is_some());
    assert!(duration.accuracy.is_some());

    let memory = result
        .trends
        .iter()
        .find(|t| t.metric == MetricKind::Memory)
        .unwrap();
    assert_eq!(memory.direction, TrendDirection::Stable);

    assert!(result
        .recommendations
        .iter()
        .any(|r| r.category == RecommendationCategory::Monitoring));
}

#[test]
fn test_new_test_on_another_scale_is_not_a_trend() {
    let baseline = BaselineSource::from(vec![record("net", "small", 10.0), record("net", "large", 1000.0)]);
    let mut detector = detector();

    for _ in 0..9 {
        detector.detect(&[record("net", "small", 10.0)], &baseline, 5.0).unwrap();
    }
    let current = vec![record("net", "small", 10.0), record("net", "large", 1000.0)];
    let result = detector.detect(&current, &baseline, 5.0).unwrap();

    assert_eq!(result.regressions_detected, 0);
    let duration = result
        .trends
        .iter()
        .find(|t| t.metric == MetricKind::Duration)
        .unwrap();
    assert_eq!(duration.tests, 2);
    assert_eq!(duration.direction, TrendDirection::Stable);
    assert_eq!(duration.slope, 0.0);
}

#[test]
fn test_low_iteration_test_is_excluded_and_flagged() {
    let baseline = BaselineSource::from(vec![record("io", "short", 10.0)]);
    let short = BenchmarkRecord::new("io", "short", 2, 20.0);
    let mut detector = detector();

    let result = detector.detect(std::slice::from_ref(&short), &baseline, 5.0).unwrap();

    assert_eq!(result.total_tests, 0);
    assert_eq!(result.regressions_detected, 0);
    assert_eq!(
        result.comparison.excluded[0].reason,
        ExclusionReason::InsufficientIterations {
            iterations: 2,
            required: 5
        }
    );

    let signals = false_positive_signals(&short, &[], detector.config());
    assert!(signals
        .iter()
        .any(|s| s.reason == FalsePositiveReason::InsufficientData));
}

#[test]
fn test_non_finite_change_skips_only_that_test() {
    let baseline = BaselineSource::from(vec![
        record("mem", "tiny", 10.0).with_heap_used(1e-320),
        record("api", "login", 100.0),
    ]);
    let current = vec![
        record("mem", "tiny", 10.0).with_heap_used(1e10),
        record("api", "login", 160.0),
    ];

    let result = detector().detect(&current, &baseline, 5.0).unwrap();

    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].test_key, "mem.tiny");
    assert!(result.alerts().all(|a| a.test_key == "api.login"));
    assert!(!result.critical_regressions.is_empty());

    // The skipped test is gone from the counts and the comparison
    assert_eq!(result.total_tests, 1);
    assert_eq!(result.comparison.summary.total_tests, 1);
    let keys: Vec<&str> = result.comparison.comparisons.iter().map(|c| c.test_key.as_str()).collect();
    assert_eq!(keys, vec!["api.login"]);
    assert!(result.comparison.summary.average_changes.values().all(|v| v.is_finite()));

    // Non-finite numbers would come back as null and fail to deserialize
    let json = serde_json::to_string(&result).unwrap();
    let restored: RegressionDetectionResult = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.total_tests, 1);
    assert_eq!(restored.warnings, result.warnings);
    assert_eq!(restored.summary.regression_rate, result.summary.regression_rate);
}

#[test]
fn test_systemic_root_cause_across_tests() {
    let baseline = BaselineSource::from(vec![
        record("db", "insert", 50.0),
        record("db", "select", 20.0),
    ]);
    let current = vec![record("db", "insert", 60.0), record("db", "select", 24.0)];

    let result = detector().detect(&current, &baseline, 5.0).unwrap();

    let duration_alerts: Vec<&RegressionAlert> = result
        .alerts()
        .filter(|a| a.metric == MetricKind::Duration)
        .collect();
    assert_eq!(duration_alerts.len(), 2);
    for alert in duration_alerts {
        assert_eq!(alert.root_cause.causes[0].kind, CauseKind::SystemicChange);
        assert!((alert.root_cause.confidence - 0.7).abs() < 1e-9);
    }
}

#[test]
fn test_environment_warning_marks_false_positive() {
    let baseline = BaselineSource::from(vec![record("gc", "sweep", 100.0)]);
    let current = vec![record("gc", "sweep", 130.0).with_warning("High memory pressure on runner")];

    let result = detector().detect(&current, &baseline, 5.0).unwrap();

    assert!(!result.false_positives.is_empty());
    assert!(result
        .false_positives
        .iter()
        .all(|fp| fp.has(FalsePositiveReason::EnvironmentalVariance)));
}

#[test]
fn test_flaky_history_marks_false_positive() {
    let baseline = BaselineSource::from(vec![record("net", "fetch", 10.0)]);
    let mut detector = detector();

    let mut last = None;
    for mean in [50.0, 5.0, 50.0] {
        last = Some(detector.detect(&[record("net", "fetch", mean)], &baseline, 5.0).unwrap());
    }
    let result = last.unwrap();

    assert!(!result.critical_regressions.is_empty());
    assert!(result
        .false_positives
        .iter()
        .any(|fp| fp.has(FalsePositiveReason::FlakyHistory)));
}

#[test]
fn test_alert_and_health_events() {
    let (notifier, seen) = capture_events();
    let baseline = BaselineSource::from(vec![
        record("a", "one", 10.0),
        record("a", "two", 10.0),
        record("a", "three", 10.0),
    ]);
    let current = vec![
        record("a", "one", 10.0).with_heap_used(3_000_000.0),
        record("a", "two", 10.0).with_heap_used(3_000_000.0),
        record("a", "three", 10.0).with_heap_used(3_000_000.0),
    ];

    let mut detector = detector().with_notifier(notifier);
    let result = detector.detect(&current, &baseline, 5.0).unwrap();
    assert_eq!(result.summary.health_score, 10.0);

    let events = seen.lock().unwrap();
    let kinds: Vec<&str> = events.iter().map(Event::kind).collect();
    assert_eq!(
        kinds,
        vec!["progress", "progress", "progress", "alert", "health_degraded"]
    );

    let Event::Alert(alert) = &events[3] else {
        panic!("expected alert event");
    };
    assert_eq!(alert.severity, AlertSeverity::Critical);
    assert_eq!(alert.count, 3);
    assert!(alert.alerts.contains(&"a.two:memory".to_string()));
}

#[test]
fn test_panicking_observer_does_not_abort_detection() {
    let notifier = Notifier::new(Arc::new(|_: &Event| panic!("observer down")));
    let baseline = BaselineSource::from(vec![record("a", "one", 10.0)]);
    let current = vec![record("a", "one", 10.0).with_heap_used(3_000_000.0)];

    let mut detector = detector().with_notifier(notifier);
    let result = detector.detect(&current, &baseline, 5.0).unwrap();
    assert_eq!(result.critical_regressions.len(), 1);
}

#[test]
fn test_recommendation_blocks() {
    let baseline = BaselineSource::from(vec![
        record("a", "crit", 10.0),
        record("a", "fast", 100.0),
        record("b", "m1", 10.0),
        record("b", "m2", 10.0),
    ]);
    let current = vec![
        record("a", "crit", 30.0).with_percentiles(10.0, 10.0), // +200% mean only
        record("a", "fast", 60.0), // -40%
        record("b", "m1", 11.5),   // +15%
        record("b", "m2", 11.5),   // +15%
    ];

    let result = detector().detect(&current, &baseline, 5.0).unwrap();

    // Six minor alerts: mean, p95 and p99 duration on each of b.m1 and b.m2
    assert_eq!(result.minor_regressions.len(), 6);

    let categories: Vec<RecommendationCategory> =
        result.recommendations.iter().map(|r| r.category).collect();
    assert_eq!(
        categories,
        vec![
            RecommendationCategory::Performance,
            RecommendationCategory::Validation,
            RecommendationCategory::Process,
        ]
    );
    assert_eq!(result.recommendations[0].priority, Priority::Critical);
    assert!(result.recommendations[0]
        .action_items
        .iter()
        .any(|item| item.contains("a.crit")));
    assert!(result.recommendations[1]
        .action_items
        .iter()
        .any(|item| item.contains("a.fast")));
}

#[test]
fn test_clean_run_has_no_alerts_or_recommendations() {
    let records = vec![record("a", "one", 10.0), record("a", "two", 20.0)];
    let baseline = BaselineSource::from(records.clone());

    let result = detector().detect(&records, &baseline, 5.0).unwrap();

    assert_eq!(result.regressions_detected, 0);
    assert_eq!(result.summary.health_score, 100.0);
    assert!(result.recommendations.is_empty());
    assert!(result.worst_severity().is_none());
    assert!(result.to_report_string().contains("NO REGRESSIONS DETECTED"));
}

#[derive(Default)]
struct CountingHistory {
    inner: InMemoryHistory,
    appended: usize,
}

impl HistoryStore for CountingHistory {
    fn record(&mut self, key: &str, record: BenchmarkRecord, capacity: usize) {
        self.appended += 1;
        self.inner.record(key, record, capacity);
    }

    fn window(&self, key: &str) -> Vec<&BenchmarkRecord> {
        self.inner.window(key)
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }
}

#[test]
fn test_injected_history_store() {
    let baseline = BaselineSource::from(vec![record("a", "one", 10.0)]);
    let current = vec![record("a", "one", 10.0), record("a", "unmatched", 10.0)];

    let mut detector = Detector::with_history(DetectionConfig::default(), CountingHistory::default()).unwrap();
    detector.detect(&current, &baseline, 5.0).unwrap();

    // Every current record is tracked, matched or not
    assert_eq!(detector.history().appended, 2);
    assert_eq!(detector.history().keys(), vec!["a.one".to_string(), "a.unmatched".to_string()]);
}

#[test]
fn test_report_and_json_output() {
    let baseline = BaselineSource::from(vec![record("a", "one", 10.0)]);
    let current = vec![record("a", "one", 25.0)];
    let result = detector().detect(&current, &baseline, 5.0).unwrap();

    let report = result.to_report_string();
    assert!(report.contains("CRITICAL REGRESSIONS DETECTED"));
    assert!(report.contains("a.one duration"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.json");
    result.write_json(&path).unwrap();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["critical_regressions"][0]["severity"], "critical");
    assert_eq!(json["critical_regressions"][0]["time_to_fix"], "immediate");
    assert_eq!(json["summary"]["risk_level"], "critical");
    assert_eq!(json["total_tests"], 1);
}
