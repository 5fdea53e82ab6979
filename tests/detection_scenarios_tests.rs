// End-to-end detection scenarios through the public API
//
// Baselines are written to temporary files in each accepted envelope so the
// whole path (load, history, compare, classify, trend, notify) is exercised.

use benchguard::analyzer::{detect_outliers, summarize};
use benchguard::baseline::{BaselineLoadError, BaselineSource};
use benchguard::comparator::{ChangeSignificance, ComparisonStatus};
use benchguard::detector::{
    AlertSeverity, DetectionConfig, Detector, FalsePositiveReason, TrendDirection,
};
use benchguard::error::DetectError;
use benchguard::events::{ChannelSink, Event, Notifier};
use benchguard::record::{BenchmarkRecord, MetricKind};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn record(suite: &str, test: &str, mean: f64) -> BenchmarkRecord {
    BenchmarkRecord::new(suite, test, 25, mean)
        .with_stddev(mean * 0.03)
        .with_heap_used(4_000_000.0)
        .with_cpu(50.0)
}

fn write_baseline(dir: &TempDir, name: &str, value: serde_json::Value) -> BaselineSource {
    let path = dir.path().join(name);
    fs::write(&path, value.to_string()).unwrap();
    BaselineSource::file(path)
}

#[test]
fn test_all_envelopes_give_same_result() {
    let tmp_dir = TempDir::new().unwrap();
    let records = vec![record("core", "hash", 8.0), record("core", "sort", 21.0)];
    let records_json = serde_json::to_value(&records).unwrap();
    let current = vec![record("core", "hash", 9.6), record("core", "sort", 21.0)];

    let sources = [
        write_baseline(&tmp_dir, "bare.json", records_json.clone()),
        write_baseline(&tmp_dir, "results.json", json!({ "results": records_json })),
        write_baseline(&tmp_dir, "baseline.json", json!({ "baseline": records_json })),
    ];

    let counts: Vec<usize> = sources
        .iter()
        .map(|source| {
            let mut detector = Detector::new(DetectionConfig::default()).unwrap();
            detector.detect(&current, source, 5.0).unwrap().regressions_detected
        })
        .collect();

    assert_eq!(counts[0], 3);
    assert!(counts.iter().all(|&c| c == counts[0]));
}

#[test]
fn test_unknown_envelope_names_found_shape() {
    let tmp_dir = TempDir::new().unwrap();
    let source = write_baseline(&tmp_dir, "runs.json", json!({ "runs": [] }));

    let mut detector = Detector::new(DetectionConfig::default()).unwrap();
    let err = detector
        .detect(&[record("core", "hash", 8.0)], &source, 5.0)
        .unwrap_err();

    let DetectError::Baseline(BaselineLoadError::UnexpectedShape { found, .. }) = err else {
        panic!("expected an unexpected-shape error, got {err:?}");
    };
    assert!(found.contains("runs"));
    assert!(detector.history().is_empty());
}

#[test]
fn test_twenty_percent_duration_regression() {
    let tmp_dir = TempDir::new().unwrap();
    let baseline = write_baseline(
        &tmp_dir,
        "baseline.json",
        serde_json::to_value(vec![BenchmarkRecord::new("http", "get", 10, 100.0)]).unwrap(),
    );
    let current = vec![BenchmarkRecord::new("http", "get", 10, 120.0)];

    let mut detector = Detector::new(DetectionConfig::default()).unwrap();
    let result = detector.detect(&current, &baseline, 5.0).unwrap();

    let comparison = &result.comparison.comparisons[0];
    let duration = &comparison.metrics[0];
    assert_eq!(duration.metric, MetricKind::Duration);
    assert!(duration.is_regression);
    assert_eq!(duration.percentage_change, 20.0);
    assert_eq!(duration.significance, ChangeSignificance::Medium);
    assert_eq!(comparison.overall.status, ComparisonStatus::Regression);
    assert_eq!(
        comparison.overall.primary_concern.as_deref(),
        Some("duration increased by 20.0%")
    );
}

#[test]
fn test_memory_doubling_is_critical() {
    let baseline = BaselineSource::from(vec![record("cache", "fill", 30.0)]);
    let current = vec![record("cache", "fill", 30.0).with_heap_used(8_000_000.0)];

    let mut detector = Detector::new(DetectionConfig::default()).unwrap();
    let result = detector.detect(&current, &baseline, 5.0).unwrap();

    assert_eq!(result.worst_severity(), Some(AlertSeverity::Critical));
    assert_eq!(result.critical_regressions[0].metric, MetricKind::Memory);
}

#[test]
fn test_ten_runs_of_growing_duration() {
    let tmp_dir = TempDir::new().unwrap();
    let baseline = write_baseline(
        &tmp_dir,
        "baseline.json",
        json!({ "baseline": [serde_json::to_value(record("db", "query", 40.0)).unwrap()] }),
    );

    let mut detector = Detector::new(DetectionConfig::default()).unwrap();
    let mut direction = None;
    let mut correlation = 0.0;
    for run in 0..10 {
        let current = vec![record("db", "query", 40.0 + 5.0 * run as f64)];
        let result = detector.detect(&current, &baseline, 5.0).unwrap();
        if let Some(trend) = result.trends.iter().find(|t| t.metric == MetricKind::Duration) {
            direction = Some(trend.direction);
            correlation = trend.correlation;
        }
    }

    assert_eq!(direction, Some(TrendDirection::Degrading));
    assert!(correlation > 0.9);
}

#[test]
fn test_progress_and_alerts_over_channel() {
    let (sink, receiver) = ChannelSink::bounded(16);
    let baseline = BaselineSource::from(vec![record("ui", "paint", 16.0), record("ui", "layout", 4.0)]);
    let current = vec![record("ui", "paint", 40.0), record("ui", "layout", 4.0)];

    let mut detector = Detector::new(DetectionConfig::default())
        .unwrap()
        .with_notifier(Notifier::new(Arc::new(sink)));
    detector.detect(&current, &baseline, 5.0).unwrap();

    let events: Vec<Event> = receiver.try_iter().collect();
    let progress = events.iter().filter(|e| matches!(e, Event::Progress(_))).count();
    assert_eq!(progress, 2);

    let tiers: Vec<AlertSeverity> = events
        .iter()
        .filter_map(|e| match e {
            Event::Alert(alert) => Some(alert.severity),
            _ => None,
        })
        .collect();
    // +150% on the mean, tail latency has no thresholds
    assert_eq!(tiers, vec![AlertSeverity::Critical, AlertSeverity::Minor]);
}

#[test]
fn test_permissive_preset_reports_noisy_runs_as_false_positives() {
    let baseline = BaselineSource::from(vec![record("fs", "sync", 10.0)]);
    let noisy = BenchmarkRecord::new("fs", "sync", 25, 30.0).with_stddev(20.0);

    let mut strict = Detector::new(DetectionConfig::default()).unwrap();
    let excluded = strict.detect(std::slice::from_ref(&noisy), &baseline, 5.0).unwrap();
    assert_eq!(excluded.total_tests, 0);

    let mut permissive = Detector::new(DetectionConfig::permissive()).unwrap();
    let result = permissive.detect(&[noisy], &baseline, 5.0).unwrap();
    assert!(result.regressions_detected > 0);
    assert_eq!(result.false_positives.len(), result.regressions_detected);
    assert!(result
        .false_positives
        .iter()
        .all(|fp| fp.has(FalsePositiveReason::MeasurementNoise)));
}

#[test]
fn test_summary_of_run_durations() {
    let durations = [10.0, 10.0, 10.0, 10.0, 100.0];
    let summary = summarize(&durations);
    assert_eq!(summary.count, 5);
    assert_eq!(summary.median, 10.0);
    assert_eq!(summary.outliers.outliers.len(), 1);
    assert_eq!(summary.outliers.outliers[0].value, 100.0);

    assert!(!detect_outliers(&[10.0; 5]).has_outliers());
}
