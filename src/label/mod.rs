//! Failure-label engineering -- rolling anomaly scoring, event debouncing,
//! and per-machine time-to-next-event horizons.

pub mod debounce;
pub mod engine;
pub mod horizon;
pub mod rolling;

pub use self::engine::{LabelEngine, LabeledTable};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("dataset is empty, nothing to label")]
    EmptyTable,
    #[error("feature column '{0}' not found in dataset")]
    MissingFeature(String),
}

/// Knobs for the labeling pass. Defaults match the tuning the pipeline
/// ships with; all of them can be overridden from the experiment config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Trailing window size for the rolling z-score.
    #[serde(default = "default_window")]
    pub window: usize,
    /// |z| at or above this flags a raw anomaly candidate.
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
    /// Minimum spacing between retained events, in minutes.
    #[serde(default = "default_min_gap_minutes")]
    pub min_gap_minutes: i64,
    /// Label assigned to every row when no machine ever produced an
    /// event ("effectively unbounded remaining life").
    #[serde(default = "default_sentinel_days")]
    pub sentinel_days: f64,
}

fn default_window() -> usize {
    120
}

fn default_z_threshold() -> f64 {
    3.0
}

fn default_min_gap_minutes() -> i64 {
    60
}

fn default_sentinel_days() -> f64 {
    9999.0
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            z_threshold: default_z_threshold(),
            min_gap_minutes: default_min_gap_minutes(),
            sentinel_days: default_sentinel_days(),
        }
    }
}
