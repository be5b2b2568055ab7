//! CSV ingest and processed-table export.

use anyhow::{Context, Result};
use std::path::Path;

use crate::label::LabeledTable;

/// Raw CSV contents before cleaning: header names plus stringly cells.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read a whole CSV file into memory.
pub fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open input csv {}", path.display()))?;

    let headers = reader
        .headers()
        .context("failed to read csv header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to read csv record")?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

/// Write the labeled table (machine, timestamp, features, event flag,
/// label) as the processed CSV artifact.
pub fn write_processed_csv(
    labeled: &LabeledTable,
    machine_column: &str,
    time_column: &str,
    target_column: &str,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create processed csv {}", path.display()))?;

    let mut header: Vec<&str> = vec![machine_column, time_column];
    header.extend(labeled.table.feature_columns.iter().map(String::as_str));
    header.push("failure_event");
    header.push(target_column);
    writer.write_record(&header)?;

    for (i, row) in labeled.table.rows.iter().enumerate() {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        record.push(row.machine_id.clone());
        record.push(row.timestamp.to_rfc3339());
        record.extend(row.values.iter().map(|v| v.to_string()));
        record.push(labeled.event_flags[i].to_string());
        record.push(labeled.labels[i].to_string());
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}
