// Detection result and its renderings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::classify::{AlertSeverity, RegressionAlert, SkippedTest};
use super::false_positive::FalsePositive;
use super::health::RegressionSummary;
use super::recommendations::Recommendation;
use super::trend::{PerformanceTrend, TrendDirection};
use crate::comparator::ComparisonResult;

/// Everything one detection run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionDetectionResult {
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Tests compared against the baseline
    pub total_tests: usize,
    /// Alerts across all tiers
    pub regressions_detected: usize,
    pub critical_regressions: Vec<RegressionAlert>,
    pub major_regressions: Vec<RegressionAlert>,
    pub minor_regressions: Vec<RegressionAlert>,
    pub false_positives: Vec<FalsePositive>,
    pub trends: Vec<PerformanceTrend>,
    pub summary: RegressionSummary,
    pub recommendations: Vec<Recommendation>,
    /// Tests skipped because their analysis failed
    pub warnings: Vec<SkippedTest>,
    pub comparison: ComparisonResult,
}

impl RegressionDetectionResult {
    /// Alerts from most to least severe
    pub fn alerts(&self) -> impl Iterator<Item = &RegressionAlert> {
        self.critical_regressions
            .iter()
            .chain(&self.major_regressions)
            .chain(&self.minor_regressions)
    }

    pub fn alerts_at(&self, severity: AlertSeverity) -> &[RegressionAlert] {
        match severity {
            AlertSeverity::Critical => &self.critical_regressions,
            AlertSeverity::Major => &self.major_regressions,
            AlertSeverity::Minor => &self.minor_regressions,
        }
    }

    pub fn worst_severity(&self) -> Option<AlertSeverity> {
        self.alerts().map(|a| a.severity).max()
    }

    /// Whether any alert is at `severity` or worse
    pub fn has_alerts_at_or_above(&self, severity: AlertSeverity) -> bool {
        self.worst_severity().is_some_and(|worst| worst >= severity)
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        match self.worst_severity() {
            None => report.push_str("✅ NO REGRESSIONS DETECTED\n\n"),
            Some(AlertSeverity::Critical) => report.push_str(&format!(
                "❌ CRITICAL REGRESSIONS DETECTED ({} alerts)\n\n",
                self.regressions_detected
            )),
            Some(_) => report.push_str(&format!(
                "⚠️  REGRESSIONS DETECTED ({} alerts)\n\n",
                self.regressions_detected
            )),
        }

        report.push_str(&format!("Tests compared: {}\n", self.total_tests));
        report.push_str(&format!(
            "Health score: {:.0}/100 (risk {}, action {})\n",
            self.summary.health_score, self.summary.risk_level, self.summary.action_urgency
        ));
        report.push_str(&format!(
            "Regression rate: {:.1}%\n",
            self.summary.regression_rate
        ));
        report.push_str(&format!(
            "Overall comparison: {}\n",
            self.comparison.summary.overall_status
        ));

        for severity in [AlertSeverity::Critical, AlertSeverity::Major, AlertSeverity::Minor] {
            let alerts = self.alerts_at(severity);
            if alerts.is_empty() {
                continue;
            }
            report.push_str(&format!("\n🔥 {} ({}):\n", severity, alerts.len()));
            for alert in alerts {
                report.push_str(&format!(
                    "  {} {}: {:.2} -> {:.2} ({:+.1}%)\n",
                    alert.test_key,
                    alert.metric,
                    alert.baseline_value,
                    alert.current_value,
                    alert.percentage_change
                ));
                if let Some(cause) = alert.root_cause.primary() {
                    report.push_str(&format!(
                        "    cause: {} (confidence {:.0}%)\n",
                        cause.description,
                        alert.root_cause.confidence * 100.0
                    ));
                }
                report.push_str(&format!("    action: {}\n", alert.required_action));
            }
        }

        if !self.false_positives.is_empty() {
            report.push_str(&format!(
                "\n🔇 Possible false positives ({}):\n",
                self.false_positives.len()
            ));
            for fp in &self.false_positives {
                let reasons: Vec<String> = fp.signals.iter().map(|s| s.reason.to_string()).collect();
                report.push_str(&format!(
                    "  {}:{} [{}]\n",
                    fp.test_key,
                    fp.metric,
                    reasons.join(", ")
                ));
            }
        }

        if !self.trends.is_empty() {
            report.push_str("\n📈 Trends:\n");
            for trend in &self.trends {
                report.push_str(&format!(
                    "  {}: {} (slope {:.3}/run, r={:.2}, {} runs)",
                    trend.metric, trend.direction, trend.slope, trend.correlation, trend.data_points
                ));
                if trend.direction == TrendDirection::Degrading {
                    if let Some(p) = &trend.projection {
                        report.push_str(&format!(", minor threshold in {:.1} days", p.days_to_minor));
                    }
                }
                report.push('\n');
            }
        }

        if !self.recommendations.is_empty() {
            report.push_str("\n💡 Recommendations:\n");
            for rec in &self.recommendations {
                report.push_str(&format!(
                    "  [{:?}] {} ({}, {})\n",
                    rec.priority, rec.title, rec.estimated_effort, rec.timeframe
                ));
                for item in &rec.action_items {
                    report.push_str(&format!("    - {}\n", item));
                }
            }
        }

        if !self.warnings.is_empty() {
            report.push_str(&format!("\n⚠️  Skipped tests ({}):\n", self.warnings.len()));
            for skipped in &self.warnings {
                report.push_str(&format!("  {}: {}\n", skipped.test_key, skipped.reason));
            }
        }

        report
    }

    /// Write the result as pretty-printed JSON
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize detection result")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write detection result to {}", path.display()))?;
        Ok(())
    }
}
