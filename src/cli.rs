//! CLI argument parsing for benchguard

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::detector::AlertSeverity;

/// Output format for the detection report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text report (default)
    Text,
    /// JSON for machine parsing
    Json,
}

/// Lowest alert tier that fails the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    Critical,
    Major,
    Minor,
    /// Always exit successfully
    Never,
}

impl FailOn {
    pub fn severity(self) -> Option<AlertSeverity> {
        match self {
            FailOn::Critical => Some(AlertSeverity::Critical),
            FailOn::Major => Some(AlertSeverity::Major),
            FailOn::Minor => Some(AlertSeverity::Minor),
            FailOn::Never => None,
        }
    }
}

/// Preset to start the configuration from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Default,
    Strict,
    Permissive,
}

#[derive(Parser, Debug)]
#[command(name = "benchguard")]
#[command(version)]
#[command(about = "Detect performance regressions between benchmark runs", long_about = None)]
pub struct Cli {
    /// Benchmark results of the current run (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub current: PathBuf,

    /// Baseline benchmark results (JSON list, {"results": [...]} or {"baseline": [...]})
    #[arg(short, long, value_name = "FILE")]
    pub baseline: PathBuf,

    /// Regression threshold in percent
    #[arg(short, long, default_value = "5.0")]
    pub threshold: f64,

    /// Configuration preset
    #[arg(long, value_enum, default_value = "default")]
    pub preset: Preset,

    /// TOML file with configuration overrides, applied on top of the preset
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// History file; read before detection and rewritten after it
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// Write the full result as JSON to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format on stdout
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Exit with status 1 when an alert at this tier or above is present
    #[arg(long = "fail-on", value_enum, default_value = "critical")]
    pub fail_on: FailOn,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
