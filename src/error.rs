//! Fatal error taxonomy
//!
//! Baseline load failures and configuration errors abort a run. Per-test
//! analysis failures are recoverable and live in the detector as
//! [`crate::detector::AnalysisError`].

use crate::baseline::BaselineLoadError;
use thiserror::Error;

/// Invalid configuration values, rejected when configuration is built or merged
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{metric}.{field} must be a finite non-negative percentage, got {value}")]
    InvalidThreshold {
        metric: String,
        field: &'static str,
        value: f64,
    },

    #[error("{metric} thresholds must satisfy critical >= major >= minor")]
    ThresholdOrder { metric: String },

    #[error("{name} {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Errors returned by a detection run
#[derive(Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Baseline(#[from] BaselineLoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for detection runs
pub type Result<T> = std::result::Result<T, DetectError>;
