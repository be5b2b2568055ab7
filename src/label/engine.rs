//! Runs the full labeling pass over a cleaned sensor table.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::data::SensorTable;
use crate::label::debounce::debounce_events;
use crate::label::horizon::{impute_labels, time_to_next_event};
use crate::label::rolling::rolling_zscore;
use crate::label::{LabelConfig, LabelError};

/// The input table (sorted by machine then timestamp) augmented with the
/// engineered event and label columns, index-aligned with `table.rows`.
#[derive(Debug, Clone)]
pub struct LabeledTable {
    pub table: SensorTable,
    pub event_flags: Vec<u8>,
    pub labels: Vec<f64>,
}

impl LabeledTable {
    pub fn event_count(&self) -> usize {
        self.event_flags.iter().filter(|&&f| f == 1).count()
    }
}

/// Per-machine labeling pipeline: rolling z-score -> threshold flags ->
/// debounced events -> time-to-next-event, then dataset-wide imputation.
pub struct LabelEngine {
    config: LabelConfig,
}

impl LabelEngine {
    pub fn new(config: LabelConfig) -> Self {
        Self { config }
    }

    /// Label every row of `table` against the named feature column.
    ///
    /// Sorts the table by (machine, timestamp) first; output columns are
    /// aligned with that ordering. Every row comes back with a defined,
    /// non-negative label -- degenerate inputs are resolved by the
    /// imputation fallbacks, not dropped.
    pub fn label(&self, mut table: SensorTable, feature: &str) -> Result<LabeledTable, LabelError> {
        if table.is_empty() {
            return Err(LabelError::EmptyTable);
        }
        let feature_idx = table
            .feature_index(feature)
            .ok_or_else(|| LabelError::MissingFeature(feature.to_string()))?;

        table.sort_canonical();

        let n = table.len();
        let min_gap = Duration::minutes(self.config.min_gap_minutes);
        let mut event_flags = vec![0u8; n];
        let mut raw_labels: Vec<Option<f64>> = Vec::with_capacity(n);

        // Contiguous runs of one machine after the canonical sort.
        let mut start = 0;
        while start < n {
            let mut end = start + 1;
            while end < n && table.rows[end].machine_id == table.rows[start].machine_id {
                end += 1;
            }

            let values: Vec<f64> = table.rows[start..end]
                .iter()
                .map(|r| r.values[feature_idx])
                .collect();
            let times: Vec<DateTime<Utc>> =
                table.rows[start..end].iter().map(|r| r.timestamp).collect();

            let scores = rolling_zscore(&values, self.config.window);
            let candidates: Vec<DateTime<Utc>> = scores
                .iter()
                .zip(times.iter())
                .filter(|(score, _)| score.abs() >= self.config.z_threshold)
                .map(|(_, t)| *t)
                .collect();
            let events = debounce_events(&candidates, min_gap);

            // Mark rows whose timestamp survived debouncing.
            let mut k = 0;
            for (i, &t) in times.iter().enumerate() {
                while k < events.len() && events[k] < t {
                    k += 1;
                }
                if k < events.len() && events[k] == t {
                    event_flags[start + i] = 1;
                }
            }

            debug!(
                machine = %table.rows[start].machine_id,
                rows = end - start,
                candidates = candidates.len(),
                events = events.len(),
                "labeled machine"
            );

            raw_labels.extend(time_to_next_event(&times, &events));
            start = end;
        }

        let labels = impute_labels(&raw_labels, self.config.sentinel_days);

        Ok(LabeledTable {
            table,
            event_flags,
            labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Observation;
    use chrono::TimeZone;

    fn table_for(machines: &[(&str, Vec<f64>)]) -> SensorTable {
        let mut rows = Vec::new();
        for (machine, values) in machines {
            for (i, &v) in values.iter().enumerate() {
                rows.push(Observation {
                    machine_id: machine.to_string(),
                    timestamp: Utc.timestamp_opt(i as i64 * 3600, 0).unwrap(),
                    values: vec![v],
                });
            }
        }
        SensorTable {
            feature_columns: vec!["axis_1".to_string()],
            rows,
        }
    }

    /// Alternating baseline with one large spike near the end.
    fn spiky_signal(len: usize, spike_at: usize) -> Vec<f64> {
        let mut values: Vec<f64> = (0..len).map(|i| if i % 2 == 0 { 1.0 } else { 2.0 }).collect();
        values[spike_at] = 100.0;
        values
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let engine = LabelEngine::new(LabelConfig::default());
        let table = SensorTable {
            feature_columns: vec!["axis_1".to_string()],
            rows: vec![],
        };
        assert!(matches!(
            engine.label(table, "axis_1"),
            Err(LabelError::EmptyTable)
        ));
    }

    #[test]
    fn test_missing_feature_is_an_error() {
        let engine = LabelEngine::new(LabelConfig::default());
        let table = table_for(&[("m1", vec![1.0, 2.0])]);
        match engine.label(table, "axis_9") {
            Err(LabelError::MissingFeature(col)) => assert_eq!(col, "axis_9"),
            other => panic!("expected MissingFeature, got {other:?}"),
        }
    }

    #[test]
    fn test_every_row_labeled_and_non_negative() {
        let engine = LabelEngine::new(LabelConfig::default());
        let table = table_for(&[("m1", spiky_signal(40, 35)), ("m2", spiky_signal(40, 30))]);
        let labeled = engine.label(table, "axis_1").unwrap();

        assert_eq!(labeled.labels.len(), 80);
        assert_eq!(labeled.event_flags.len(), 80);
        assert!(labeled.labels.iter().all(|&l| l >= 0.0));
        assert!(labeled.event_count() >= 2);
    }

    #[test]
    fn test_quiet_machine_gets_dataset_median() {
        let engine = LabelEngine::new(LabelConfig::default());
        // m1 produces an event; m2 is flat and never flags.
        let table = table_for(&[("m1", spiky_signal(40, 35)), ("m2", vec![5.0; 40])]);
        let labeled = engine.label(table, "axis_1").unwrap();

        let m2_labels: Vec<f64> = labeled
            .table
            .rows
            .iter()
            .zip(labeled.labels.iter())
            .filter(|(row, _)| row.machine_id == "m2")
            .map(|(_, &l)| l)
            .collect();
        assert_eq!(m2_labels.len(), 40);
        let fill = m2_labels[0];
        assert!(m2_labels.iter().all(|&l| l == fill));
        assert!(fill < 9999.0, "median fill, not the sentinel");
    }

    #[test]
    fn test_no_events_anywhere_uses_sentinel() {
        let engine = LabelEngine::new(LabelConfig::default());
        let table = table_for(&[("m1", vec![1.0; 40]), ("m2", vec![2.0; 40])]);
        let labeled = engine.label(table, "axis_1").unwrap();

        assert_eq!(labeled.event_count(), 0);
        assert!(labeled.labels.iter().all(|&l| l == 9999.0));
    }

    #[test]
    fn test_relabeling_is_idempotent() {
        let engine = LabelEngine::new(LabelConfig::default());
        let table = table_for(&[("m1", spiky_signal(60, 45)), ("m2", spiky_signal(60, 30))]);

        let first = engine.label(table.clone(), "axis_1").unwrap();
        let second = engine.label(table, "axis_1").unwrap();

        assert_eq!(first.event_flags, second.event_flags);
        assert_eq!(first.labels, second.labels);
    }
}
