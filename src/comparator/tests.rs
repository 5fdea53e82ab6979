// Scenario tests for baseline comparison
//
// Cover matching rules, idempotence against the record set itself, and the
// aggregate summary across several tests.

use super::*;
use crate::record::MetricKind;
use std::sync::{Arc, Mutex};

fn record(suite: &str, test: &str, mean: f64) -> BenchmarkRecord {
    BenchmarkRecord::new(suite, test, 20, mean)
        .with_stddev(mean * 0.05)
        .with_heap_used(1_000_000.0)
        .with_cpu(40.0)
}

fn suite() -> Vec<BenchmarkRecord> {
    vec![
        record("parser", "tokenize", 12.0),
        record("parser", "parse_expr", 30.0),
        record("codegen", "emit", 55.0),
    ]
}

#[test]
fn test_self_comparison_is_neutral() {
    let records = suite();
    let result = Comparator::default().compare_records(&records, &records);

    assert_eq!(result.comparisons.len(), 3);
    for comparison in &result.comparisons {
        assert_eq!(comparison.overall.status, ComparisonStatus::Neutral);
        assert_eq!(comparison.overall.impact_score, 0.0);
        assert_eq!(comparison.regressions().count(), 0);
        assert_eq!(comparison.improvements().count(), 0);
        assert!(!comparison.metrics.is_empty());
    }
    assert_eq!(result.summary.overall_status, ComparisonStatus::Neutral);
    assert_eq!(result.summary.neutral, 3);
    assert_eq!(result.summary.average_changes[&MetricKind::Duration], 0.0);
}

#[test]
fn test_first_baseline_record_wins() {
    let baseline = vec![
        record("parser", "tokenize", 10.0),
        record("parser", "tokenize", 50.0),
    ];
    let current = vec![record("parser", "tokenize", 12.0)];

    let result = Comparator::default().compare_records(&current, &baseline);
    assert_eq!(result.comparisons[0].baseline.duration.mean, 10.0);
    assert_eq!(result.comparisons[0].metrics[0].percentage_change, 20.0);
}

#[test]
fn test_unmatched_current_records_are_dropped() {
    let baseline = vec![record("parser", "tokenize", 12.0)];
    let current = vec![
        record("parser", "tokenize", 12.0),
        record("parser", "brand_new", 7.0),
    ];

    let result = Comparator::default().compare_records(&current, &baseline);
    assert_eq!(result.comparisons.len(), 1);
    assert_eq!(result.unmatched, vec!["parser.brand_new".to_string()]);
    assert!(result.excluded.is_empty());
}

#[test]
fn test_failed_low_iteration_and_unstable_records_are_excluded() {
    let baseline = vec![
        record("a", "failed", 10.0),
        record("a", "short", 10.0),
        record("a", "noisy", 10.0),
        record("a", "noisy_baseline", 10.0).with_stddev(9.0),
    ];
    let current = vec![
        record("a", "failed", 10.0).failed(),
        BenchmarkRecord::new("a", "short", 2, 10.0),
        record("a", "noisy", 10.0).with_stddev(8.0),
        record("a", "noisy_baseline", 10.0),
    ];

    let result = Comparator::default().compare_records(&current, &baseline);
    assert!(result.comparisons.is_empty());
    assert_eq!(result.excluded.len(), 4);

    assert_eq!(result.excluded[0].reason, ExclusionReason::Failed);
    assert_eq!(
        result.excluded[1].reason,
        ExclusionReason::InsufficientIterations {
            iterations: 2,
            required: 5
        }
    );
    assert!(matches!(
        result.excluded[2].reason,
        ExclusionReason::Unstable { .. }
    ));
    assert_eq!(result.excluded[3].side, RecordSide::Baseline);
}

#[test]
fn test_failed_records_compared_when_not_excluded() {
    let config = ComparisonConfig {
        exclude_failed_tests: false,
        ..ComparisonConfig::default()
    };
    let baseline = vec![record("a", "flaky", 10.0)];
    let current = vec![record("a", "flaky", 10.0).failed()];

    let result = Comparator::new(config).compare_records(&current, &baseline);
    assert_eq!(result.comparisons.len(), 1);
}

#[test]
fn test_threshold_argument_overrides_config() {
    let baseline = vec![record("a", "b", 100.0)];
    let current = vec![record("a", "b", 108.0)];
    let source = BaselineSource::from(baseline);
    let comparator = Comparator::default();

    let loose = comparator.compare(&current, &source, 10.0).unwrap();
    assert_eq!(loose.summary.regressions, 0);
    assert_eq!(loose.regression_threshold, 10.0);
    assert_eq!(loose.improvement_threshold, -10.0);

    let strict = comparator.compare(&current, &source, 5.0).unwrap();
    assert_eq!(strict.summary.regressions, 1);
}

#[test]
fn test_missing_baseline_file_fails() {
    let source = BaselineSource::file("/nonexistent/benchguard/baseline.json");
    let err = Comparator::default()
        .compare(&suite(), &source, 5.0)
        .unwrap_err();
    assert!(matches!(err, BaselineLoadError::NotFound { .. }));
}

#[test]
fn test_summary_counts_and_overall_status() {
    let baseline = suite();
    let current = vec![
        record("parser", "tokenize", 18.0),   // +50% -> high regression
        record("parser", "parse_expr", 36.0), // +20% -> medium regression
        record("codegen", "emit", 44.0),      // -20% -> improvement
    ];

    let result = Comparator::default().compare_records(&current, &baseline);
    let summary = &result.summary;

    assert_eq!(summary.total_tests, 3);
    assert_eq!(summary.regressions, 2);
    assert_eq!(summary.improvements, 1);
    assert_eq!(summary.critical_tests, 0);
    assert_eq!(summary.overall_status, ComparisonStatus::Regression);

    let avg = summary.average_changes[&MetricKind::Duration];
    // averaged in f32 lanes
    assert!((avg - (50.0 + 20.0 - 20.0) / 3.0).abs() < 1e-5);
    assert_eq!(summary.average_changes[&MetricKind::Memory], 0.0);
}

#[test]
fn test_single_critical_regression_decides_overall() {
    let baseline = suite();
    let current = vec![
        record("parser", "tokenize", 30.0),   // +150%
        record("parser", "parse_expr", 20.0), // -33%
        record("codegen", "emit", 40.0),      // -27%
    ];

    let result = Comparator::default().compare_records(&current, &baseline);
    assert_eq!(result.summary.improvements, 2);
    assert_eq!(result.summary.critical_tests, 1);
    assert_eq!(result.summary.overall_status, ComparisonStatus::Regression);
}

#[test]
fn test_significant_tests_are_counted() {
    let baseline = vec![record("a", "b", 100.0)];
    let current = vec![record("a", "b", 130.0)];

    let result = Comparator::default().compare_records(&current, &baseline);
    assert!(result.comparisons[0].significance.is_significant);
    assert_eq!(result.summary.significant_tests, 1);
    assert!(result.comparisons[0].overall.confidence > 0.99);
}

#[test]
fn test_progress_event_per_compared_pair() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&seen);
    let notifier = Notifier::new(Arc::new(move |event: &Event| {
        if let Event::Progress(progress) = event {
            captured
                .lock()
                .unwrap()
                .push((progress.index, progress.total, progress.test_key.clone()));
        }
    }));

    let baseline = vec![record("a", "one", 10.0), record("a", "two", 10.0)];
    let current = vec![
        record("a", "one", 10.0),
        record("a", "missing", 10.0),
        record("a", "two", 10.0),
    ];

    Comparator::default()
        .with_notifier(notifier)
        .compare_records(&current, &baseline);

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            (1, 3, "a.one".to_string()),
            (3, 3, "a.two".to_string())
        ]
    );
}

#[test]
fn test_result_serializes_to_json() {
    let records = suite();
    let result = Comparator::default().compare_records(&records, &records);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["summary"]["overall_status"], "neutral");
    assert_eq!(json["comparisons"][0]["metrics"][0]["metric"], "duration");
    assert_eq!(json["summary"]["average_changes"]["duration"], 0.0);
}

#[test]
fn test_removed_tests_leave_the_summary() {
    let baseline = suite();
    let current = vec![
        record("parser", "tokenize", 24.0),
        record("parser", "parse_expr", 30.0),
        record("codegen", "emit", 55.0),
    ];
    let mut result = Comparator::default().compare_records(&current, &baseline);
    assert_eq!(result.summary.regressions, 1);

    result.remove_tests(&["parser.tokenize"]);

    assert_eq!(result.comparisons.len(), 2);
    assert_eq!(result.summary.total_tests, 2);
    assert_eq!(result.summary.regressions, 0);
    assert_eq!(result.summary.average_changes[&MetricKind::Duration], 0.0);

    let before = result.clone();
    result.remove_tests(&[]);
    assert_eq!(result, before);
}
