//! Benchguard - performance regression detection for benchmark suites
//!
//! This library compares benchmark results against a baseline, escalates
//! regressions into severity-classified alerts, and tracks per-test history
//! to spot slow drifts before they cross a threshold.
//!
//! - [`comparator`]: per-metric comparison, significance test, verdicts
//! - [`analyzer`]: descriptive statistics, outliers, trends, forecasts
//! - [`detector`]: alerts, root cause, false positives, trends, health

pub mod analyzer;
pub mod baseline;
pub mod cli;
pub mod comparator;
pub mod detector;
pub mod error;
pub mod events;
pub mod record;
