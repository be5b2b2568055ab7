//! Sensor data model and ingest collaborators -- CSV loading, cleaning,
//! synthetic fleet replication.

pub mod clean;
pub mod loader;
pub mod replicate;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("required column '{column}' not found in input")]
    MissingColumn { column: String },
    #[error("dataset is empty after cleaning ({dropped} rows dropped for unparseable timestamps)")]
    EmptyAfterCleaning { dropped: usize },
    #[error("no numeric feature columns survived cleaning")]
    NoFeatureColumns,
}

/// One cleaned sensor reading. `values` is aligned with the owning
/// table's `feature_columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub machine_id: String,
    pub timestamp: DateTime<Utc>,
    pub values: Vec<f64>,
}

/// A cleaned, in-memory sensor table: one row per reading, one numeric
/// column per feature.
#[derive(Debug, Clone, Default)]
pub struct SensorTable {
    pub feature_columns: Vec<String>,
    pub rows: Vec<Observation>,
}

impl SensorTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a feature column by name.
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_columns.iter().position(|c| c == name)
    }

    /// Number of distinct machines in the table.
    pub fn machine_count(&self) -> usize {
        let mut ids: Vec<&str> = self.rows.iter().map(|r| r.machine_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Stable sort by (machine_id, timestamp). Labeling requires this
    /// ordering; ties keep their input order.
    pub fn sort_canonical(&mut self) {
        self.rows
            .sort_by(|a, b| (a.machine_id.as_str(), a.timestamp).cmp(&(b.machine_id.as_str(), b.timestamp)));
    }
}
