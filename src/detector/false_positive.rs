// False-positive analysis for raised alerts
//
// An alert is not withdrawn here; it is annotated with the reasons it might
// not be real so a reader can discount it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::classify::RegressionAlert;
use super::config::DetectionConfig;
use super::history::history_stability;
use crate::record::{BenchmarkRecord, MetricKind};

/// Coefficient of variation above which a measurement is considered noise
const NOISE_CV: f64 = 0.5;

/// History points needed before judging a test flaky
const MIN_HISTORY_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FalsePositiveReason {
    MeasurementNoise,
    InsufficientData,
    EnvironmentalVariance,
    FlakyHistory,
}

impl std::fmt::Display for FalsePositiveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FalsePositiveReason::MeasurementNoise => "measurement-noise",
            FalsePositiveReason::InsufficientData => "insufficient-data",
            FalsePositiveReason::EnvironmentalVariance => "environmental-variance",
            FalsePositiveReason::FlakyHistory => "flaky-history",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalsePositiveSignal {
    pub reason: FalsePositiveReason,
    pub detail: String,
}

/// An alert that may not be a real regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalsePositive {
    pub test_key: String,
    pub metric: MetricKind,
    pub signals: Vec<FalsePositiveSignal>,
}

impl FalsePositive {
    pub fn has(&self, reason: FalsePositiveReason) -> bool {
        self.signals.iter().any(|s| s.reason == reason)
    }
}

fn environment_warning(warning: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let regex = RE.get_or_init(|| {
        Regex::new(r"(?i)\b(cpu|memory|system)\b").expect("Failed to compile environment warning pattern")
    });
    regex.is_match(warning)
}

/// Reasons to doubt a regression on `record`, in a fixed order
///
/// `history` is the test's window including the current run.
pub fn false_positive_signals(
    record: &BenchmarkRecord,
    history: &[&BenchmarkRecord],
    config: &DetectionConfig,
) -> Vec<FalsePositiveSignal> {
    let mut signals = Vec::new();

    let cv = record.coefficient_of_variation();
    if cv > NOISE_CV {
        signals.push(FalsePositiveSignal {
            reason: FalsePositiveReason::MeasurementNoise,
            detail: format!("coefficient of variation {:.2} > {:.2}", cv, NOISE_CV),
        });
    }

    let required = config.statistical.min_sample_size as u64;
    if record.iterations < required {
        signals.push(FalsePositiveSignal {
            reason: FalsePositiveReason::InsufficientData,
            detail: format!("{} iterations < {} required", record.iterations, required),
        });
    }

    if let Some(warning) = record.warnings.iter().find(|w| environment_warning(w)) {
        signals.push(FalsePositiveSignal {
            reason: FalsePositiveReason::EnvironmentalVariance,
            detail: format!("harness warning: {}", warning),
        });
    }

    if config.filtering.exclude_flaky {
        if let Some(stability) = history_stability(history, MIN_HISTORY_POINTS) {
            if stability < config.filtering.min_stability {
                signals.push(FalsePositiveSignal {
                    reason: FalsePositiveReason::FlakyHistory,
                    detail: format!(
                        "historical stability {:.2} < {:.2} over {} runs",
                        stability,
                        config.filtering.min_stability,
                        history.len()
                    ),
                });
            }
        }
    }

    signals
}

/// Annotate `alert` if its current record gives reason for doubt
pub fn analyze_false_positive(
    alert: &RegressionAlert,
    record: &BenchmarkRecord,
    history: &[&BenchmarkRecord],
    config: &DetectionConfig,
) -> Option<FalsePositive> {
    let signals = false_positive_signals(record, history, config);
    if signals.is_empty() {
        return None;
    }
    Some(FalsePositive {
        test_key: alert.test_key.clone(),
        metric: alert.metric,
        signals,
    })
}
