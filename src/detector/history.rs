// Bounded per-test history of benchmark records
//
// Each test key owns a FIFO window of its most recent records. The detector
// appends every current record before comparing and evicts the oldest entry
// once the window exceeds `trend_analysis_window`. Where the history lives
// (and whether it survives the process) is up to the store implementation.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::analyzer::coefficient_of_variation;
use crate::record::BenchmarkRecord;

/// Storage for per-test historical windows
pub trait HistoryStore {
    /// Append `record` to the window of `key`, keeping at most `capacity` entries
    fn record(&mut self, key: &str, record: BenchmarkRecord, capacity: usize);

    /// Records for `key`, oldest first; empty for unknown keys
    fn window(&self, key: &str) -> Vec<&BenchmarkRecord>;

    /// Every key with at least one record
    fn keys(&self) -> Vec<String>;

    fn clear(&mut self);
}

/// History kept in process memory
///
/// Serializable so callers can persist it between runs.
///
/// # Example
/// ```
/// use benchguard::detector::{HistoryStore, InMemoryHistory};
/// use benchguard::record::BenchmarkRecord;
///
/// let mut history = InMemoryHistory::default();
/// for mean in [10.0, 11.0, 12.0] {
///     history.record("api.login", BenchmarkRecord::new("api", "login", 10, mean), 2);
/// }
///
/// let means: Vec<f64> = history.window("api.login").iter().map(|r| r.duration.mean).collect();
/// assert_eq!(means, vec![11.0, 12.0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryHistory {
    windows: HashMap<String, VecDeque<BenchmarkRecord>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked test keys
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl HistoryStore for InMemoryHistory {
    fn record(&mut self, key: &str, record: BenchmarkRecord, capacity: usize) {
        let window = self.windows.entry(key.to_string()).or_default();
        window.push_back(record);
        while window.len() > capacity {
            window.pop_front();
        }
        tracing::debug!("History for {}: {} of {} entries", key, window.len(), capacity);
    }

    fn window(&self, key: &str) -> Vec<&BenchmarkRecord> {
        self.windows
            .get(key)
            .map(|w| w.iter().collect())
            .unwrap_or_default()
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.windows.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn clear(&mut self) {
        self.windows.clear();
    }
}

/// Stability (1 - coefficient of variation) of the historical duration means
///
/// `None` when there are fewer than `min_points` records, or when the
/// window's statistics are not finite.
pub fn history_stability(window: &[&BenchmarkRecord], min_points: usize) -> Option<f64> {
    if window.len() < min_points.max(1) {
        return None;
    }

    let means: Vec<f64> = window.iter().map(|r| r.duration.mean).collect();
    let cv = coefficient_of_variation(&means);
    cv.is_finite().then(|| 1.0 - cv)
}
