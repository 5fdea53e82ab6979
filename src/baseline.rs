//! Baseline loading
//!
//! A baseline is a set of benchmark records from a known-good run. It arrives
//! in one of three JSON envelopes:
//!
//! ```text
//! [ {record}, ... ]                 bare list
//! { "results":  [ {record}, ... ] }
//! { "baseline": [ {record}, ... ] }
//! ```
//!
//! Anything else is a load error that names the shape actually found.

use crate::record::BenchmarkRecord;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading baseline (or current) records
#[derive(Error, Debug)]
pub enum BaselineLoadError {
    #[error("Baseline file not found: {path}")]
    NotFound { path: String },

    #[error("Failed to read baseline {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Baseline {source_id} is not valid JSON: {source}")]
    Parse {
        source_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Baseline {source_id} has unexpected shape: expected a list of records, \
         {{\"results\": [...]}} or {{\"baseline\": [...]}}, found {found} ({detail})"
    )]
    UnexpectedShape {
        source_id: String,
        found: String,
        detail: String,
    },
}

/// Accepted record envelopes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecordEnvelope {
    Bare(Vec<BenchmarkRecord>),
    Results { results: Vec<BenchmarkRecord> },
    Baseline { baseline: Vec<BenchmarkRecord> },
}

impl RecordEnvelope {
    pub fn into_records(self) -> Vec<BenchmarkRecord> {
        match self {
            RecordEnvelope::Bare(records) => records,
            RecordEnvelope::Results { results } => results,
            RecordEnvelope::Baseline { baseline } => baseline,
        }
    }
}

/// Where baseline records come from
#[derive(Debug, Clone)]
pub enum BaselineSource {
    /// JSON file on disk
    File(PathBuf),
    /// Already-parsed JSON document
    Json(Value),
    /// Records supplied directly by the caller
    Records(Vec<BenchmarkRecord>),
}

impl BaselineSource {
    pub fn file(path: impl AsRef<Path>) -> Self {
        BaselineSource::File(path.as_ref().to_path_buf())
    }

    /// Identifier used in error messages
    pub fn id(&self) -> String {
        match self {
            BaselineSource::File(path) => path.display().to_string(),
            BaselineSource::Json(_) => "<inline json>".to_string(),
            BaselineSource::Records(_) => "<in-memory records>".to_string(),
        }
    }

    /// Load the records this source describes
    pub fn load(&self) -> Result<Vec<BenchmarkRecord>, BaselineLoadError> {
        match self {
            BaselineSource::File(path) => load_records(path),
            BaselineSource::Json(value) => decode_value(&self.id(), value),
            BaselineSource::Records(records) => Ok(records.clone()),
        }
    }
}

impl From<Vec<BenchmarkRecord>> for BaselineSource {
    fn from(records: Vec<BenchmarkRecord>) -> Self {
        BaselineSource::Records(records)
    }
}

impl From<PathBuf> for BaselineSource {
    fn from(path: PathBuf) -> Self {
        BaselineSource::File(path)
    }
}

/// Load records from a JSON file in any accepted envelope
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<BenchmarkRecord>, BaselineLoadError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    if !path.exists() {
        return Err(BaselineLoadError::NotFound { path: display });
    }

    let text = std::fs::read_to_string(path).map_err(|source| BaselineLoadError::Io {
        path: display.clone(),
        source,
    })?;

    parse_records(&display, &text)
}

/// Parse records from JSON text in any accepted envelope
///
/// # Example
/// ```
/// use benchguard::baseline::parse_records;
///
/// let text = r#"{"results": [{"suite": "io", "test": "read", "iterations": 10,
///                              "duration": {"mean": 2.0}}]}"#;
/// let records = parse_records("inline", text).unwrap();
/// assert_eq!(records[0].key(), "io.read");
///
/// assert!(parse_records("inline", r#"{"runs": []}"#).is_err());
/// ```
pub fn parse_records(source_id: &str, text: &str) -> Result<Vec<BenchmarkRecord>, BaselineLoadError> {
    let value: Value = serde_json::from_str(text).map_err(|source| BaselineLoadError::Parse {
        source_id: source_id.to_string(),
        source,
    })?;
    decode_value(source_id, &value)
}

fn decode_value(source_id: &str, value: &Value) -> Result<Vec<BenchmarkRecord>, BaselineLoadError> {
    let envelope = RecordEnvelope::deserialize(value).map_err(|e| {
        BaselineLoadError::UnexpectedShape {
            source_id: source_id.to_string(),
            found: describe_shape(value),
            detail: e.to_string(),
        }
    })?;

    let records = envelope.into_records();
    tracing::debug!("Loaded {} records from {}", records.len(), source_id);
    Ok(records)
}

/// Short human-readable description of a JSON value's shape
fn describe_shape(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(items) => format!("list of {} malformed entries", items.len()),
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
    }
}
