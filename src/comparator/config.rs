// Configuration for baseline/current comparison

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Matching filters and change thresholds for the comparator
///
/// # Example
/// ```
/// use benchguard::comparator::ComparisonConfig;
///
/// let config = ComparisonConfig::default().with_threshold(10.0);
/// assert_eq!(config.regression_threshold, 10.0);
/// assert_eq!(config.improvement_threshold, -10.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Percentage change above which a metric regressed
    pub regression_threshold: f64,

    /// Percentage change below which a metric improved (negative)
    pub improvement_threshold: f64,

    /// Records with fewer iterations are not compared
    pub min_iterations: u64,

    /// Records whose coefficient of variation exceeds this are not compared
    ///
    /// `f64::INFINITY` disables the check.
    pub max_variability: f64,

    /// Skip records whose run did not succeed
    pub exclude_failed_tests: bool,

    /// Confidence level used to flag the significance test (0.95 = p < 0.05)
    pub confidence_level: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            regression_threshold: 5.0,
            improvement_threshold: -5.0,
            min_iterations: 5,
            max_variability: 0.5,
            exclude_failed_tests: true,
            confidence_level: 0.95,
        }
    }
}

impl ComparisonConfig {
    /// Use `threshold` for regressions and `-threshold` for improvements
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.regression_threshold = threshold;
        self.improvement_threshold = -threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.regression_threshold.is_finite() || self.regression_threshold < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "regression_threshold",
                reason: format!(
                    "must be a finite non-negative percentage, got {}",
                    self.regression_threshold
                ),
            });
        }

        if !self.improvement_threshold.is_finite() || self.improvement_threshold > 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "improvement_threshold",
                reason: format!(
                    "must be a finite non-positive percentage, got {}",
                    self.improvement_threshold
                ),
            });
        }

        if self.max_variability.is_nan() || self.max_variability < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_variability",
                reason: format!("must be non-negative, got {}", self.max_variability),
            });
        }

        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "confidence_level",
                reason: format!("must be in (0, 1), got {}", self.confidence_level),
            });
        }

        Ok(())
    }
}
