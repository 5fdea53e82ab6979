//! Benchmark records produced by the external harness
//!
//! A record is one measured test: identity (`suite`, `test`), the iteration
//! count, and duration/memory/CPU statistics. Field names follow the harness
//! JSON (`heapUsed`, `p95`, ...), so records deserialize straight from its
//! output.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzer::variation_ratio;

/// Duration statistics for a benchmark, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Memory statistics for a benchmark, in bytes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryStats {
    pub heap_used: f64,
    pub heap_total: f64,
    pub external: f64,
    pub rss: f64,
}

/// CPU statistics for a benchmark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuStats {
    /// Utilisation percentage (0-100 per core)
    pub percentage: f64,
    /// User time in milliseconds
    pub user: f64,
    /// System time in milliseconds
    pub system: f64,
}

fn default_success() -> bool {
    true
}

/// One benchmark measurement as emitted by the harness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub suite: String,
    pub test: String,
    #[serde(default)]
    pub iterations: u64,
    #[serde(default)]
    pub duration: DurationStats,
    #[serde(default)]
    pub memory: MemoryStats,
    #[serde(default)]
    pub cpu: CpuStats,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: u64,
}

impl BenchmarkRecord {
    /// Create a successful record with a flat duration profile
    ///
    /// Median, min, max and percentiles all start at `mean`; use the
    /// `with_*` builders to shape the rest.
    ///
    /// # Example
    /// ```
    /// use benchguard::record::BenchmarkRecord;
    ///
    /// let record = BenchmarkRecord::new("parser", "tokenize", 50, 12.5).with_heap_used(4096.0);
    /// assert_eq!(record.key(), "parser.tokenize");
    /// assert_eq!(record.duration.p95, 12.5);
    /// ```
    pub fn new(suite: impl Into<String>, test: impl Into<String>, iterations: u64, mean: f64) -> Self {
        Self {
            suite: suite.into(),
            test: test.into(),
            iterations,
            duration: DurationStats {
                mean,
                median: mean,
                min: mean,
                max: mean,
                stddev: 0.0,
                p95: mean,
                p99: mean,
            },
            memory: MemoryStats::default(),
            cpu: CpuStats::default(),
            success: true,
            warnings: Vec::new(),
            timestamp: 0,
        }
    }

    pub fn with_stddev(mut self, stddev: f64) -> Self {
        self.duration.stddev = stddev;
        self
    }

    pub fn with_percentiles(mut self, p95: f64, p99: f64) -> Self {
        self.duration.p95 = p95;
        self.duration.p99 = p99;
        self
    }

    pub fn with_heap_used(mut self, bytes: f64) -> Self {
        self.memory.heap_used = bytes;
        self
    }

    pub fn with_cpu(mut self, percentage: f64) -> Self {
        self.cpu.percentage = percentage;
        self
    }

    pub fn with_timestamp(mut self, millis: u64) -> Self {
        self.timestamp = millis;
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Mark the record as a failed run
    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }

    /// Test key used for matching and history: `suite.test`
    pub fn key(&self) -> String {
        test_key(&self.suite, &self.test)
    }

    /// Coefficient of variation of the duration samples (stddev / mean)
    ///
    /// Returns 0.0 when the mean is (near) zero.
    pub fn coefficient_of_variation(&self) -> f64 {
        variation_ratio(self.duration.stddev, self.duration.mean)
    }

    /// Read the value of a compared metric from this record
    pub fn metric(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::Duration => self.duration.mean,
            MetricKind::Memory => self.memory.heap_used,
            MetricKind::Cpu => self.cpu.percentage,
            MetricKind::P95Duration => self.duration.p95,
            MetricKind::P99Duration => self.duration.p99,
        }
    }
}

/// Build the `suite.test` identity
pub fn test_key(suite: &str, test: &str) -> String {
    format!("{}.{}", suite, test)
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Metrics compared between current and baseline records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    /// `duration.mean`
    Duration,
    /// `memory.heapUsed`
    Memory,
    /// `cpu.percentage`
    Cpu,
    /// `duration.p95`
    P95Duration,
    /// `duration.p99`
    P99Duration,
}

impl MetricKind {
    /// Comparison order
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Duration,
        MetricKind::Memory,
        MetricKind::Cpu,
        MetricKind::P95Duration,
        MetricKind::P99Duration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Duration => "duration",
            MetricKind::Memory => "memory",
            MetricKind::Cpu => "cpu",
            MetricKind::P95Duration => "p95Duration",
            MetricKind::P99Duration => "p99Duration",
        }
    }

    /// Latency metrics are what users feel
    pub fn is_user_facing(self) -> bool {
        matches!(
            self,
            MetricKind::Duration | MetricKind::P95Duration | MetricKind::P99Duration
        )
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
