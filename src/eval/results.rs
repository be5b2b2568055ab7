//! Append-only results CSV, one row per trained model per run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub run_tag: String,
    pub model_type: String,
    pub feature: String,
    pub target: String,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    /// Blank for models without these hyperparameters.
    pub learning_rate: Option<f64>,
    pub epochs: Option<usize>,
    pub notes: String,
    pub recorded_at: String,
}

/// Append records to the tracking CSV, writing the header only when the
/// file does not exist yet.
pub fn append_results(path: &Path, records: &[ResultRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let write_header = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open results csv {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().context("failed to flush results csv")?;

    Ok(())
}
