// Escalation of metric regressions into alerts
//
// Every regressed metric of every compared test becomes one alert. Severity
// comes from the metric's configured thresholds; impact and time-to-fix are
// fixed per severity tier; root cause is a set of cheap heuristics that look
// at the other regressions of the same run.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::config::{DetectionConfig, MetricThresholds, SeverityThresholds};
use crate::comparator::{ChangeSignificance, ComparisonResult};
use crate::record::MetricKind;

/// Alert tier, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Minor,
    Major,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertSeverity::Minor => "minor",
            AlertSeverity::Major => "major",
            AlertSeverity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Expected turnaround for fixing an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeToFix {
    /// Within a day
    Immediate,
    /// Within a week
    ShortTerm,
    /// Next planning cycle
    LongTerm,
}

impl TimeToFix {
    pub fn for_severity(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Critical => TimeToFix::Immediate,
            AlertSeverity::Major => TimeToFix::ShortTerm,
            AlertSeverity::Minor => TimeToFix::LongTerm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionImpact {
    /// Latency metrics are felt by users; memory and CPU are not directly
    pub user_facing: bool,
    pub affected_users_percent: f64,
    /// 0-1, grows with severity
    pub technical_debt_score: f64,
    pub business_impact: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CauseKind {
    SystemicChange,
    MemoryDrivenDegradation,
    AlgorithmicChange,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspectedCause {
    pub kind: CauseKind,
    pub description: String,
    /// Confidence this signal contributed
    pub weight: f64,
}

/// Best-effort explanation of a regression, strongest signal first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCauseAnalysis {
    pub causes: Vec<SuspectedCause>,
    /// In [0, 1]
    pub confidence: f64,
}

impl RootCauseAnalysis {
    pub fn primary(&self) -> Option<&SuspectedCause> {
        self.causes.first()
    }
}

/// One regressed metric escalated into an actionable alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionAlert {
    pub test_key: String,
    pub metric: MetricKind,
    pub current_value: f64,
    pub baseline_value: f64,
    pub percentage_change: f64,
    pub severity: AlertSeverity,
    /// Bucket assigned by the comparator
    pub significance: ChangeSignificance,
    /// 1 - p of the pair's significance test
    pub confidence: f64,
    pub impact: RegressionImpact,
    pub root_cause: RootCauseAnalysis,
    pub required_action: String,
    pub time_to_fix: TimeToFix,
}

impl RegressionAlert {
    /// `suite.test:metric`
    pub fn label(&self) -> String {
        format!("{}:{}", self.test_key, self.metric)
    }
}

/// Per-test failure that skips the test instead of aborting the run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("{test_key}: {metric} change is not a finite number")]
    NonFiniteMetric { test_key: String, metric: MetricKind },
}

impl AnalysisError {
    pub fn test_key(&self) -> &str {
        match self {
            AnalysisError::NonFiniteMetric { test_key, .. } => test_key,
        }
    }
}

/// A test left out of alerting, and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTest {
    pub test_key: String,
    pub reason: String,
}

impl From<&AnalysisError> for SkippedTest {
    fn from(err: &AnalysisError) -> Self {
        Self {
            test_key: err.test_key().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Severity for a change, by the first of critical/major/minor that |change| meets
///
/// Metrics without configured thresholds are minor.
///
/// # Example
/// ```
/// use benchguard::detector::{classify_severity, AlertSeverity, SeverityThresholds};
///
/// let memory = SeverityThresholds::new(100.0, 50.0, 20.0, 50.0);
/// assert_eq!(classify_severity(100.0, Some(&memory)), AlertSeverity::Critical);
/// assert_eq!(classify_severity(60.0, Some(&memory)), AlertSeverity::Major);
/// assert_eq!(classify_severity(60.0, None), AlertSeverity::Minor);
/// ```
pub fn classify_severity(percentage_change: f64, thresholds: Option<&SeverityThresholds>) -> AlertSeverity {
    let Some(t) = thresholds else {
        return AlertSeverity::Minor;
    };
    let magnitude = percentage_change.abs();
    if magnitude >= t.critical {
        AlertSeverity::Critical
    } else if magnitude >= t.major {
        AlertSeverity::Major
    } else {
        AlertSeverity::Minor
    }
}

/// Fixed impact estimate per severity tier
pub fn assess_impact(
    metric: MetricKind,
    percentage_change: f64,
    severity: AlertSeverity,
    thresholds: &MetricThresholds,
) -> RegressionImpact {
    let user_facing = metric.is_user_facing();
    let (affected_users_percent, technical_debt_score) = match (severity, user_facing) {
        (AlertSeverity::Critical, true) => (80.0, 0.8),
        (AlertSeverity::Critical, false) => (20.0, 0.8),
        (AlertSeverity::Major, true) => (50.0, 0.6),
        (AlertSeverity::Major, false) => (10.0, 0.6),
        (AlertSeverity::Minor, true) => (20.0, 0.3),
        (AlertSeverity::Minor, false) => (5.0, 0.3),
    };

    let user_impact = thresholds
        .get(metric)
        .unwrap_or(&thresholds.duration)
        .user_impact;
    let noticeable = percentage_change.abs() >= user_impact;

    let business_impact = match (user_facing, noticeable) {
        (true, true) => format!(
            "User-visible slowdown: {} up {:.1}% (users notice beyond {:.0}%)",
            metric, percentage_change, user_impact
        ),
        (true, false) => format!(
            "{} up {:.1}%, below the {:.0}% users notice",
            metric, percentage_change, user_impact
        ),
        (false, true) => format!(
            "Resource pressure: {} up {:.1}%, expect higher infrastructure cost",
            metric, percentage_change
        ),
        (false, false) => format!("Increased resource usage: {} up {:.1}%", metric, percentage_change),
    };

    RegressionImpact {
        user_facing,
        affected_users_percent,
        technical_debt_score,
        business_impact,
    }
}

/// A regressed metric considered for root-cause analysis
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionFinding {
    pub test_key: String,
    pub metric: MetricKind,
    pub percentage_change: f64,
}

const BASE_CONFIDENCE: f64 = 0.5;
const SYSTEMIC_WEIGHT: f64 = 0.2;
const MEMORY_DRIVEN_WEIGHT: f64 = 0.3;
const ALGORITHMIC_WEIGHT: f64 = 0.2;

/// Root-cause heuristics for `finding`, given every regression of the run
pub fn analyze_root_cause(finding: &RegressionFinding, all: &[RegressionFinding]) -> RootCauseAnalysis {
    let mut causes = Vec::new();
    let magnitude = finding.percentage_change.abs();

    let similar = all
        .iter()
        .filter(|other| {
            other.test_key != finding.test_key
                && other.metric == finding.metric
                && (other.percentage_change.abs() - magnitude).abs() <= 0.2 * magnitude
        })
        .count();
    if similar > 0 {
        causes.push(SuspectedCause {
            kind: CauseKind::SystemicChange,
            description: format!(
                "{} other test(s) regressed on {} by a similar amount; likely a shared dependency or environment change",
                similar, finding.metric
            ),
            weight: SYSTEMIC_WEIGHT,
        });
    }

    let regressed_here = |metric: MetricKind| {
        all.iter()
            .any(|f| f.test_key == finding.test_key && f.metric == metric)
    };
    if regressed_here(MetricKind::Memory) && regressed_here(MetricKind::Duration) {
        causes.push(SuspectedCause {
            kind: CauseKind::MemoryDrivenDegradation,
            description: "Memory and duration regressed together; allocation or GC pressure likely slows the test"
                .to_string(),
            weight: MEMORY_DRIVEN_WEIGHT,
        });
    }

    if magnitude > 50.0 {
        causes.push(SuspectedCause {
            kind: CauseKind::AlgorithmicChange,
            description: format!(
                "{:.1}% change suggests an algorithmic change or a new code path",
                magnitude
            ),
            weight: ALGORITHMIC_WEIGHT,
        });
    }

    if causes.is_empty() {
        return RootCauseAnalysis {
            causes: vec![SuspectedCause {
                kind: CauseKind::Unknown,
                description: "unknown, requires investigation".to_string(),
                weight: 0.0,
            }],
            confidence: BASE_CONFIDENCE,
        };
    }

    // Stable sort keeps detection order among equal weights
    causes.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    let confidence = (BASE_CONFIDENCE + causes.iter().map(|c| c.weight).sum::<f64>()).min(1.0);

    RootCauseAnalysis { causes, confidence }
}

fn required_action(severity: AlertSeverity, test_key: &str, metric: MetricKind, change: f64) -> String {
    match severity {
        AlertSeverity::Critical => format!(
            "Block the release: revert or fix the change behind {} ({} +{:.1}%)",
            test_key, metric, change
        ),
        AlertSeverity::Major => format!(
            "Investigate {} before the next release ({} +{:.1}%)",
            test_key, metric, change
        ),
        AlertSeverity::Minor => format!("Monitor {} in upcoming runs ({} +{:.1}%)", test_key, metric, change),
    }
}

/// Turn every metric regression of `comparison` into an alert
///
/// Tests with a non-finite regressed metric are skipped and reported as
/// errors; alerts for the remaining tests are unaffected.
pub fn build_alerts(
    comparison: &ComparisonResult,
    config: &DetectionConfig,
) -> (Vec<RegressionAlert>, Vec<AnalysisError>) {
    let mut errors = Vec::new();
    let mut findings = Vec::new();
    let mut accepted = Vec::new();

    for test in &comparison.comparisons {
        let bad = test.metrics.iter().find(|m| {
            !(m.percentage_change.is_finite() && m.current_value.is_finite() && m.baseline_value.is_finite())
        });
        if let Some(bad) = bad {
            errors.push(AnalysisError::NonFiniteMetric {
                test_key: test.test_key.clone(),
                metric: bad.metric,
            });
            continue;
        }
        for m in test.regressions() {
            findings.push(RegressionFinding {
                test_key: test.test_key.clone(),
                metric: m.metric,
                percentage_change: m.percentage_change,
            });
        }
        accepted.push(test);
    }

    let mut alerts = Vec::new();
    for test in accepted {
        for m in test.regressions() {
            let severity = classify_severity(m.percentage_change, config.thresholds.get(m.metric));
            let finding = RegressionFinding {
                test_key: test.test_key.clone(),
                metric: m.metric,
                percentage_change: m.percentage_change,
            };
            alerts.push(RegressionAlert {
                test_key: test.test_key.clone(),
                metric: m.metric,
                current_value: m.current_value,
                baseline_value: m.baseline_value,
                percentage_change: m.percentage_change,
                severity,
                significance: m.significance,
                confidence: m.confidence_level,
                impact: assess_impact(m.metric, m.percentage_change, severity, &config.thresholds),
                root_cause: analyze_root_cause(&finding, &findings),
                required_action: required_action(severity, &test.test_key, m.metric, m.percentage_change),
                time_to_fix: TimeToFix::for_severity(severity),
            });
        }
    }

    (alerts, errors)
}
