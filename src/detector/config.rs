// Configuration for regression detection
//
// Fully specified structure with documented defaults. Partial configuration
// (a TOML file, CLI flags) arrives as `DetectionConfigOverrides` and is merged
// field by field, then validated before any detection run can use it.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::comparator::ComparisonConfig;
use crate::error::ConfigError;
use crate::record::MetricKind;

/// Percentage-change cutoffs for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub critical: f64,
    pub major: f64,
    pub minor: f64,
    /// Change above which users are expected to notice
    pub user_impact: f64,
}

impl SeverityThresholds {
    pub const fn new(critical: f64, major: f64, minor: f64, user_impact: f64) -> Self {
        Self {
            critical,
            major,
            minor,
            user_impact,
        }
    }

    fn validate(&self, metric: &str) -> Result<(), ConfigError> {
        let fields = [
            ("critical", self.critical),
            ("major", self.major),
            ("minor", self.minor),
            ("user_impact", self.user_impact),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold {
                    metric: metric.to_string(),
                    field,
                    value,
                });
            }
        }
        if self.critical < self.major || self.major < self.minor {
            return Err(ConfigError::ThresholdOrder {
                metric: metric.to_string(),
            });
        }
        Ok(())
    }
}

/// Severity thresholds per metric
///
/// Tail latency has no thresholds of its own unless configured; alerts on
/// unconfigured metrics are classified minor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricThresholds {
    pub duration: SeverityThresholds,
    pub memory: SeverityThresholds,
    pub cpu: SeverityThresholds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p95_duration: Option<SeverityThresholds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p99_duration: Option<SeverityThresholds>,
}

impl Default for MetricThresholds {
    fn default() -> Self {
        Self {
            duration: SeverityThresholds::new(50.0, 25.0, 10.0, 15.0),
            memory: SeverityThresholds::new(100.0, 50.0, 20.0, 50.0),
            cpu: SeverityThresholds::new(75.0, 40.0, 15.0, 30.0),
            p95_duration: None,
            p99_duration: None,
        }
    }
}

impl MetricThresholds {
    pub fn get(&self, metric: MetricKind) -> Option<&SeverityThresholds> {
        match metric {
            MetricKind::Duration => Some(&self.duration),
            MetricKind::Memory => Some(&self.memory),
            MetricKind::Cpu => Some(&self.cpu),
            MetricKind::P95Duration => self.p95_duration.as_ref(),
            MetricKind::P99Duration => self.p99_duration.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalConfig {
    /// Confidence level for the significance test (0.95 = p < 0.05)
    pub confidence_level: f64,
    /// Runs with fewer iterations are not compared
    pub min_sample_size: usize,
    /// History entries kept per test key
    pub trend_analysis_window: usize,
}

impl Default for StatisticalConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            min_sample_size: 5,
            trend_analysis_window: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteringConfig {
    /// Keep unstable records (CV above 1 - min_stability) out of comparison
    pub exclude_flaky: bool,
    /// Minimum stability, where stability = 1 - coefficient of variation
    pub min_stability: f64,
    pub exclude_failed_tests: bool,
}

impl Default for FilteringConfig {
    fn default() -> Self {
        Self {
            exclude_flaky: true,
            min_stability: 0.5,
            exclude_failed_tests: true,
        }
    }
}

/// |slope| per run below which a trend counts as stable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StableSlopes {
    /// Milliseconds per run
    pub duration: f64,
    /// Bytes per run
    pub memory: f64,
    /// Percentage points per run
    pub cpu: f64,
}

impl Default for StableSlopes {
    fn default() -> Self {
        Self {
            duration: 0.5,
            memory: 1_048_576.0,
            cpu: 0.5,
        }
    }
}

/// Longest forecast a config may request, one year of daily runs
pub const MAX_FORECAST_HORIZON: usize = 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    pub stable_slope: StableSlopes,
    /// Detection runs per day, used to turn run counts into days
    pub runs_per_day: f64,
    /// Runs projected past the latest one
    pub forecast_horizon: usize,
    /// Autocorrelation above which history counts as periodic
    pub seasonality_threshold: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            stable_slope: StableSlopes::default(),
            runs_per_day: 1.0,
            forecast_horizon: 5,
            seasonality_threshold: 0.6,
        }
    }
}

/// Complete detection configuration
///
/// # Example
/// ```
/// use benchguard::detector::DetectionConfig;
///
/// let config = DetectionConfig::default();
/// assert_eq!(config.thresholds.duration.critical, 50.0);
/// assert_eq!(config.statistical.trend_analysis_window, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub thresholds: MetricThresholds,
    pub statistical: StatisticalConfig,
    pub filtering: FilteringConfig,
    pub trend: TrendConfig,
}

impl DetectionConfig {
    /// Tighter thresholds and more samples (fewer false negatives)
    pub fn strict() -> Self {
        Self {
            thresholds: MetricThresholds {
                duration: SeverityThresholds::new(30.0, 15.0, 5.0, 10.0),
                memory: SeverityThresholds::new(50.0, 25.0, 10.0, 25.0),
                cpu: SeverityThresholds::new(50.0, 25.0, 10.0, 20.0),
                p95_duration: None,
                p99_duration: None,
            },
            statistical: StatisticalConfig {
                confidence_level: 0.99,
                min_sample_size: 10,
                trend_analysis_window: 20,
            },
            ..Self::default()
        }
    }

    /// Looser thresholds for noisy environments (fewer false positives)
    pub fn permissive() -> Self {
        Self {
            thresholds: MetricThresholds {
                duration: SeverityThresholds::new(100.0, 50.0, 20.0, 30.0),
                memory: SeverityThresholds::new(200.0, 100.0, 40.0, 100.0),
                cpu: SeverityThresholds::new(150.0, 75.0, 30.0, 60.0),
                p95_duration: None,
                p99_duration: None,
            },
            statistical: StatisticalConfig {
                confidence_level: 0.90,
                min_sample_size: 3,
                trend_analysis_window: 10,
            },
            filtering: FilteringConfig {
                exclude_flaky: false,
                ..FilteringConfig::default()
            },
            ..Self::default()
        }
    }

    /// Apply `overrides` on top of this configuration and validate the result
    pub fn merge(&self, overrides: &DetectionConfigOverrides) -> Result<Self, ConfigError> {
        let mut merged = self.clone();
        overrides.apply(&mut merged);
        merged.validate()?;
        Ok(merged)
    }

    /// Parse TOML overrides and merge them onto the defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::default().merge_toml_str(text)
    }

    /// Parse TOML overrides and merge them onto this configuration
    pub fn merge_toml_str(&self, text: &str) -> Result<Self, ConfigError> {
        let overrides: DetectionConfigOverrides =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        self.merge(&overrides)
    }

    /// Merge a TOML override file onto this configuration
    pub fn merge_file(&self, path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        self.merge_toml_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.duration.validate("duration")?;
        self.thresholds.memory.validate("memory")?;
        self.thresholds.cpu.validate("cpu")?;
        if let Some(t) = &self.thresholds.p95_duration {
            t.validate("p95Duration")?;
        }
        if let Some(t) = &self.thresholds.p99_duration {
            t.validate("p99Duration")?;
        }

        let stats = &self.statistical;
        if !(stats.confidence_level > 0.0 && stats.confidence_level < 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "confidence_level",
                reason: format!("must be in (0, 1), got {}", stats.confidence_level),
            });
        }
        if stats.min_sample_size < 1 {
            return Err(ConfigError::InvalidParameter {
                name: "min_sample_size",
                reason: "must be >= 1".to_string(),
            });
        }
        if stats.trend_analysis_window < 2 {
            return Err(ConfigError::InvalidParameter {
                name: "trend_analysis_window",
                reason: format!(
                    "must be >= 2 to fit a trend, got {}",
                    stats.trend_analysis_window
                ),
            });
        }

        if !(0.0..=1.0).contains(&self.filtering.min_stability) {
            return Err(ConfigError::InvalidParameter {
                name: "min_stability",
                reason: format!("must be in [0, 1], got {}", self.filtering.min_stability),
            });
        }

        let slopes = &self.trend.stable_slope;
        for (name, value) in [
            ("stable_slope.duration", slopes.duration),
            ("stable_slope.memory", slopes.memory),
            ("stable_slope.cpu", slopes.cpu),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("must be finite and non-negative, got {}", value),
                });
            }
        }
        if !(self.trend.runs_per_day.is_finite() && self.trend.runs_per_day > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "runs_per_day",
                reason: format!("must be positive, got {}", self.trend.runs_per_day),
            });
        }
        if !(self.trend.seasonality_threshold > 0.0 && self.trend.seasonality_threshold <= 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "seasonality_threshold",
                reason: format!("must be in (0, 1], got {}", self.trend.seasonality_threshold),
            });
        }
        if !(1..=MAX_FORECAST_HORIZON).contains(&self.trend.forecast_horizon) {
            return Err(ConfigError::InvalidParameter {
                name: "forecast_horizon",
                reason: format!(
                    "must be in [1, {}], got {}",
                    MAX_FORECAST_HORIZON, self.trend.forecast_horizon
                ),
            });
        }

        Ok(())
    }

    /// Largest coefficient of variation a record may have to be compared
    pub fn max_variability(&self) -> f64 {
        if self.filtering.exclude_flaky {
            1.0 - self.filtering.min_stability
        } else {
            f64::INFINITY
        }
    }

    /// Comparator settings for a run with the given regression threshold
    pub fn comparison_config(&self, threshold: f64) -> ComparisonConfig {
        ComparisonConfig {
            min_iterations: self.statistical.min_sample_size as u64,
            max_variability: self.max_variability(),
            exclude_failed_tests: self.filtering.exclude_failed_tests,
            confidence_level: self.statistical.confidence_level,
            ..ComparisonConfig::default()
        }
        .with_threshold(threshold)
    }
}

/// Partial severity thresholds
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityThresholdOverrides {
    pub critical: Option<f64>,
    pub major: Option<f64>,
    pub minor: Option<f64>,
    pub user_impact: Option<f64>,
}

impl SeverityThresholdOverrides {
    fn apply(&self, target: &mut SeverityThresholds) {
        if let Some(v) = self.critical {
            target.critical = v;
        }
        if let Some(v) = self.major {
            target.major = v;
        }
        if let Some(v) = self.minor {
            target.minor = v;
        }
        if let Some(v) = self.user_impact {
            target.user_impact = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricThresholdOverrides {
    pub duration: Option<SeverityThresholdOverrides>,
    pub memory: Option<SeverityThresholdOverrides>,
    pub cpu: Option<SeverityThresholdOverrides>,
    pub p95_duration: Option<SeverityThresholdOverrides>,
    pub p99_duration: Option<SeverityThresholdOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatisticalOverrides {
    pub confidence_level: Option<f64>,
    pub min_sample_size: Option<usize>,
    pub trend_analysis_window: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilteringOverrides {
    pub exclude_flaky: Option<bool>,
    pub min_stability: Option<f64>,
    pub exclude_failed_tests: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StableSlopeOverrides {
    pub duration: Option<f64>,
    pub memory: Option<f64>,
    pub cpu: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrendOverrides {
    pub stable_slope: Option<StableSlopeOverrides>,
    pub runs_per_day: Option<f64>,
    pub forecast_horizon: Option<usize>,
    pub seasonality_threshold: Option<f64>,
}

/// Optional overrides for every configuration field
///
/// # Example
/// ```
/// use benchguard::detector::DetectionConfig;
///
/// let config = DetectionConfig::from_toml_str(r#"
///     [thresholds.memory]
///     critical = 80.0
///
///     [statistical]
///     trend_analysis_window = 20
/// "#).unwrap();
///
/// assert_eq!(config.thresholds.memory.critical, 80.0);
/// assert_eq!(config.thresholds.memory.major, 50.0);
/// assert_eq!(config.statistical.trend_analysis_window, 20);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionConfigOverrides {
    pub thresholds: Option<MetricThresholdOverrides>,
    pub statistical: Option<StatisticalOverrides>,
    pub filtering: Option<FilteringOverrides>,
    pub trend: Option<TrendOverrides>,
}

impl DetectionConfigOverrides {
    fn apply(&self, config: &mut DetectionConfig) {
        if let Some(t) = &self.thresholds {
            let base = config.thresholds.duration;
            if let Some(o) = &t.duration {
                o.apply(&mut config.thresholds.duration);
            }
            if let Some(o) = &t.memory {
                o.apply(&mut config.thresholds.memory);
            }
            if let Some(o) = &t.cpu {
                o.apply(&mut config.thresholds.cpu);
            }
            // Tail latency starts from the mean-duration thresholds when first configured
            if let Some(o) = &t.p95_duration {
                o.apply(config.thresholds.p95_duration.get_or_insert(base));
            }
            if let Some(o) = &t.p99_duration {
                o.apply(config.thresholds.p99_duration.get_or_insert(base));
            }
        }

        if let Some(s) = &self.statistical {
            if let Some(v) = s.confidence_level {
                config.statistical.confidence_level = v;
            }
            if let Some(v) = s.min_sample_size {
                config.statistical.min_sample_size = v;
            }
            if let Some(v) = s.trend_analysis_window {
                config.statistical.trend_analysis_window = v;
            }
        }

        if let Some(f) = &self.filtering {
            if let Some(v) = f.exclude_flaky {
                config.filtering.exclude_flaky = v;
            }
            if let Some(v) = f.min_stability {
                config.filtering.min_stability = v;
            }
            if let Some(v) = f.exclude_failed_tests {
                config.filtering.exclude_failed_tests = v;
            }
        }

        if let Some(t) = &self.trend {
            if let Some(slopes) = &t.stable_slope {
                if let Some(v) = slopes.duration {
                    config.trend.stable_slope.duration = v;
                }
                if let Some(v) = slopes.memory {
                    config.trend.stable_slope.memory = v;
                }
                if let Some(v) = slopes.cpu {
                    config.trend.stable_slope.cpu = v;
                }
            }
            if let Some(v) = t.runs_per_day {
                config.trend.runs_per_day = v;
            }
            if let Some(v) = t.forecast_horizon {
                config.trend.forecast_horizon = v;
            }
            if let Some(v) = t.seasonality_threshold {
                config.trend.seasonality_threshold = v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectionConfig::default();
        assert_eq!(config.thresholds.duration, SeverityThresholds::new(50.0, 25.0, 10.0, 15.0));
        assert_eq!(config.thresholds.memory.critical, 100.0);
        assert_eq!(config.thresholds.cpu.major, 40.0);
        assert_eq!(config.statistical.confidence_level, 0.95);
        assert_eq!(config.statistical.min_sample_size, 5);
        assert!(config.filtering.exclude_flaky);
        assert_eq!(config.filtering.min_stability, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(DetectionConfig::strict().validate().is_ok());
        assert!(DetectionConfig::permissive().validate().is_ok());
        assert!(
            DetectionConfig::strict().thresholds.duration.critical
                < DetectionConfig::permissive().thresholds.duration.critical
        );
    }

    #[test]
    fn test_merge_is_field_by_field() {
        let overrides = DetectionConfigOverrides {
            thresholds: Some(MetricThresholdOverrides {
                cpu: Some(SeverityThresholdOverrides {
                    minor: Some(5.0),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            filtering: Some(FilteringOverrides {
                exclude_failed_tests: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = DetectionConfig::default().merge(&overrides).unwrap();
        assert_eq!(merged.thresholds.cpu.minor, 5.0);
        assert_eq!(merged.thresholds.cpu.critical, 75.0);
        assert!(!merged.filtering.exclude_failed_tests);
        assert!(merged.filtering.exclude_flaky);
    }

    #[test]
    fn test_negative_threshold_rejected_at_merge() {
        let err = DetectionConfig::from_toml_str("[thresholds.duration]\nminor = -1.0\n").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidThreshold {
                metric: "duration".to_string(),
                field: "minor",
                value: -1.0
            }
        );
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let err = DetectionConfig::from_toml_str("[thresholds.memory]\nmajor = 150.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdOrder { .. }));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = DetectionConfig::from_toml_str("[statistical]\nwindow = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_tail_latency_thresholds_seeded_from_duration() {
        let config = DetectionConfig::from_toml_str("[thresholds.p95_duration]\ncritical = 80.0\n").unwrap();
        let p95 = config.thresholds.p95_duration.unwrap();
        assert_eq!(p95.critical, 80.0);
        assert_eq!(p95.major, 25.0);
        assert!(config.thresholds.p99_duration.is_none());
    }

    #[test]
    fn test_overrides_apply_on_top_of_preset() {
        let config = DetectionConfig::strict()
            .merge_toml_str("[statistical]\nmin_sample_size = 4\n")
            .unwrap();
        assert_eq!(config.statistical.min_sample_size, 4);
        assert_eq!(config.statistical.confidence_level, 0.99);
        assert_eq!(config.thresholds.duration.critical, 30.0);
    }

    #[test]
    fn test_merge_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(&path, "[trend]\nforecast_horizon = 3\n").unwrap();
        let config = DetectionConfig::default().merge_file(&path).unwrap();
        assert_eq!(config.trend.forecast_horizon, 3);

        let missing = DetectionConfig::default()
            .merge_file(dir.path().join("missing.toml"))
            .unwrap_err();
        assert!(missing.to_string().contains("missing.toml"));
    }

    #[test]
    fn test_invalid_statistical_parameters() {
        assert!(DetectionConfig::from_toml_str("[statistical]\nconfidence_level = 1.5\n").is_err());
        assert!(DetectionConfig::from_toml_str("[statistical]\nmin_sample_size = 0\n").is_err());
        assert!(DetectionConfig::from_toml_str("[statistical]\ntrend_analysis_window = 1\n").is_err());
        assert!(DetectionConfig::from_toml_str("[filtering]\nmin_stability = 2.0\n").is_err());
        assert!(DetectionConfig::from_toml_str("[trend]\nruns_per_day = 0.0\n").is_err());
    }

    #[test]
    fn test_forecast_horizon_bounds() {
        let err = DetectionConfig::from_toml_str("[trend]\nforecast_horizon = 9223372036854775807\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter { name: "forecast_horizon", .. }
        ));
        assert!(DetectionConfig::from_toml_str("[trend]\nforecast_horizon = 0\n").is_err());

        let longest = format!("[trend]\nforecast_horizon = {}\n", MAX_FORECAST_HORIZON);
        let config = DetectionConfig::from_toml_str(&longest).unwrap();
        assert_eq!(config.trend.forecast_horizon, MAX_FORECAST_HORIZON);

        let mut config = DetectionConfig::default();
        config.trend.forecast_horizon = MAX_FORECAST_HORIZON + 1;
        assert!(crate::detector::Detector::new(config).is_err());
    }

    #[test]
    fn test_comparison_config_derivation() {
        let config = DetectionConfig::default();
        let comparison = config.comparison_config(7.5);
        assert_eq!(comparison.regression_threshold, 7.5);
        assert_eq!(comparison.improvement_threshold, -7.5);
        assert_eq!(comparison.min_iterations, 5);
        assert_eq!(comparison.max_variability, 0.5);

        let permissive = DetectionConfig::permissive().comparison_config(5.0);
        assert!(permissive.max_variability.is_infinite());
    }
}
