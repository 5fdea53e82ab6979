// Run-wide health summary

use serde::{Deserialize, Serialize};

/// Health scores below this raise a `HealthDegraded` event
pub const HEALTH_ALERT_THRESHOLD: f64 = 70.0;

const CRITICAL_PENALTY: f64 = 30.0;
const MAJOR_PENALTY: f64 = 15.0;
const MINOR_PENALTY: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// What to do about the run, mirroring the worst alert tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionUrgency {
    Immediate,
    Investigate,
    Monitor,
    None,
}

impl std::fmt::Display for ActionUrgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionUrgency::Immediate => "immediate",
            ActionUrgency::Investigate => "investigate",
            ActionUrgency::Monitor => "monitor",
            ActionUrgency::None => "none",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionSummary {
    /// 0-100, higher is healthier
    pub health_score: f64,
    /// Alerts per compared test, in percent
    pub regression_rate: f64,
    pub risk_level: RiskLevel,
    pub action_urgency: ActionUrgency,
    pub total_alerts: usize,
}

impl RegressionSummary {
    pub fn is_degraded(&self) -> bool {
        self.health_score < HEALTH_ALERT_THRESHOLD
    }
}

/// Summarize a run from its alert counts
///
/// # Example
/// ```
/// use benchguard::detector::{summarize_health, ActionUrgency, RiskLevel};
///
/// let summary = summarize_health(1, 2, 0, 10);
/// assert_eq!(summary.health_score, 40.0);
/// assert_eq!(summary.regression_rate, 30.0);
/// assert_eq!(summary.risk_level, RiskLevel::Critical);
/// assert_eq!(summary.action_urgency, ActionUrgency::Immediate);
/// ```
pub fn summarize_health(critical: usize, major: usize, minor: usize, total_tests: usize) -> RegressionSummary {
    let penalty = CRITICAL_PENALTY * critical as f64 + MAJOR_PENALTY * major as f64 + MINOR_PENALTY * minor as f64;
    let health_score = (100.0 - penalty).max(0.0);

    let total_alerts = critical + major + minor;
    let regression_rate = if total_tests == 0 {
        0.0
    } else {
        total_alerts as f64 / total_tests as f64 * 100.0
    };

    let risk_level = if critical > 0 {
        RiskLevel::Critical
    } else if major > 2 || regression_rate > 20.0 {
        RiskLevel::High
    } else if major > 0 || regression_rate > 10.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let action_urgency = if critical > 0 {
        ActionUrgency::Immediate
    } else if major > 0 {
        ActionUrgency::Investigate
    } else if minor > 0 {
        ActionUrgency::Monitor
    } else {
        ActionUrgency::None
    };

    RegressionSummary {
        health_score,
        regression_rate,
        risk_level,
        action_urgency,
        total_alerts,
    }
}
