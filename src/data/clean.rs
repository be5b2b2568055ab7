//! Upstream cleaning -- timestamp parsing and missing-value handling.
//!
//! The labeling core assumes every row it sees has a valid timestamp and
//! numeric feature values; this module is the collaborator that makes
//! that true.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::data::loader::RawTable;
use crate::data::{DataError, Observation, SensorTable};

#[derive(Debug, Default, Clone)]
pub struct CleanReport {
    pub dropped_rows: usize,
    pub filled_cells: usize,
    pub dropped_columns: Vec<String>,
}

/// Parse timestamps (dropping rows where that fails), classify the
/// remaining columns as numeric features or not, and fill missing
/// numeric cells with the column median.
///
/// A column counts as numeric when every non-empty cell parses as f64;
/// columns that never produce a number are dropped. If `machine_column`
/// is absent every row gets `default_machine` as its id.
pub fn clean_table(
    raw: &RawTable,
    machine_column: &str,
    time_column: &str,
    default_machine: &str,
) -> Result<(SensorTable, CleanReport), DataError> {
    let time_idx = raw
        .headers
        .iter()
        .position(|h| h == time_column)
        .ok_or_else(|| DataError::MissingColumn {
            column: time_column.to_string(),
        })?;
    let machine_idx = raw.headers.iter().position(|h| h == machine_column);

    let mut report = CleanReport::default();

    // Rows that survive timestamp parsing, in input order.
    let mut kept: Vec<(usize, DateTime<Utc>)> = Vec::with_capacity(raw.rows.len());
    for (i, row) in raw.rows.iter().enumerate() {
        match row.get(time_idx).and_then(|s| parse_timestamp(s)) {
            Some(ts) => kept.push((i, ts)),
            None => report.dropped_rows += 1,
        }
    }

    if kept.is_empty() {
        return Err(DataError::EmptyAfterCleaning {
            dropped: report.dropped_rows,
        });
    }
    if report.dropped_rows > 0 {
        warn!(
            dropped = report.dropped_rows,
            "dropped rows with unparseable timestamps"
        );
    }

    // Classify candidate feature columns and parse their cells.
    let mut feature_columns: Vec<String> = Vec::new();
    let mut feature_cells: Vec<Vec<Option<f64>>> = Vec::new();

    for (col_idx, name) in raw.headers.iter().enumerate() {
        if col_idx == time_idx || Some(col_idx) == machine_idx {
            continue;
        }

        let mut cells: Vec<Option<f64>> = Vec::with_capacity(kept.len());
        let mut numeric = false;
        let mut non_numeric = false;

        for &(row_idx, _) in &kept {
            let cell = raw.rows[row_idx].get(col_idx).map(String::as_str).unwrap_or("");
            if cell.trim().is_empty() {
                cells.push(None);
            } else {
                match cell.trim().parse::<f64>() {
                    // Literal NaN/inf cells count as missing, not as data.
                    Ok(v) if v.is_finite() => {
                        numeric = true;
                        cells.push(Some(v));
                    }
                    Ok(_) => cells.push(None),
                    Err(_) => {
                        non_numeric = true;
                        break;
                    }
                }
            }
        }

        if non_numeric || !numeric {
            report.dropped_columns.push(name.clone());
            continue;
        }

        feature_columns.push(name.clone());
        feature_cells.push(cells);
    }

    if feature_columns.is_empty() {
        return Err(DataError::NoFeatureColumns);
    }
    if !report.dropped_columns.is_empty() {
        debug!(columns = ?report.dropped_columns, "ignored non-numeric columns");
    }

    // Median-fill the gaps, column by column.
    for cells in feature_cells.iter_mut() {
        let defined: Vec<f64> = cells.iter().filter_map(|c| *c).collect();
        let fill = median(defined);
        for cell in cells.iter_mut() {
            if cell.is_none() {
                *cell = Some(fill);
                report.filled_cells += 1;
            }
        }
    }

    let rows = kept
        .iter()
        .enumerate()
        .map(|(out_idx, &(row_idx, timestamp))| {
            let machine_id = match machine_idx {
                Some(mi) => raw.rows[row_idx]
                    .get(mi)
                    .cloned()
                    .unwrap_or_else(|| default_machine.to_string()),
                None => default_machine.to_string(),
            };
            Observation {
                machine_id,
                timestamp,
                values: feature_cells
                    .iter()
                    .map(|cells| cells[out_idx].unwrap_or(0.0))
                    .collect(),
            }
        })
        .collect();

    Ok((
        SensorTable {
            feature_columns,
            rows,
        },
        report,
    ))
}

/// Accept RFC 3339 and the common naive `YYYY-mm-dd HH:MM:SS[.fff]`
/// shapes, interpreting naive times as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
        if fmt == "%Y-%m-%d" {
            if let Ok(date) = chrono::NaiveDate::parse_from_str(s, fmt) {
                return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
            }
        }
    }
    None
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
