//! End-to-end pipeline tests against a synthetic two-machine fleet.
//!
//! Machine "alpha" carries injected torque spikes; machine "beta" is
//! flat and never produces an anomaly. The spikes sit at known indices,
//! so event positions and label values are checkable from first
//! principles.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::Path;

use fleetmedic::config::ExperimentConfig;
use fleetmedic::{run_experiment, run_labeling};

const ROWS_PER_MACHINE: usize = 400;
const SPIKE_A: usize = 60; // burst partner at 61 must be debounced away
const SPIKE_B: usize = 200;

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn row_time(i: usize) -> DateTime<Utc> {
    start_time() + Duration::minutes(10 * i as i64)
}

/// Alternating baseline with 100.0 spikes at the given indices.
fn alpha_value(i: usize) -> f64 {
    if i == SPIKE_A || i == SPIKE_A + 1 || i == SPIKE_B {
        100.0
    } else if i % 2 == 0 {
        1.0
    } else {
        2.0
    }
}

fn write_fleet_csv(path: &Path, alpha_spikes: bool) {
    let mut out = String::from("Time,robot_id,axis_1\n");
    for machine in ["alpha", "beta"] {
        for i in 0..ROWS_PER_MACHINE {
            let value = match machine {
                "alpha" if alpha_spikes => alpha_value(i),
                "alpha" => 1.0,
                _ => 5.0,
            };
            out.push_str(&format!(
                "{},{},{}\n",
                row_time(i).to_rfc3339(),
                machine,
                value
            ));
        }
    }
    std::fs::write(path, out).unwrap();
}

fn config_for(dir: &Path, alpha_spikes: bool) -> ExperimentConfig {
    let csv_path = dir.join("fleet.csv");
    write_fleet_csv(&csv_path, alpha_spikes);

    let mut cfg = ExperimentConfig::default();
    cfg.data.csv_path = csv_path.to_str().unwrap().to_string();
    cfg.data.replicate_fleet = false;
    cfg.data.db_path = dir.join("staging.db").to_str().unwrap().to_string();
    cfg.outputs.processed_csv = dir.join("processed.csv").to_str().unwrap().to_string();
    cfg.outputs.results_csv = dir.join("results.csv").to_str().unwrap().to_string();
    cfg
}

#[test]
fn test_events_detected_at_known_spikes_only() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), true);

    let labeled = run_labeling(&cfg).unwrap();

    // Sorted output: all alpha rows, then all beta rows.
    let flagged: Vec<usize> = labeled
        .event_flags
        .iter()
        .enumerate()
        .filter(|(_, &f)| f == 1)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(flagged, vec![SPIKE_A, SPIKE_B]);
}

#[test]
fn test_debounce_gap_invariant_on_output() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), true);

    let labeled = run_labeling(&cfg).unwrap();

    let mut last: Option<(&str, DateTime<Utc>)> = None;
    for (i, row) in labeled.table.rows.iter().enumerate() {
        if labeled.event_flags[i] == 0 {
            continue;
        }
        if let Some((machine, t)) = last {
            if machine == row.machine_id {
                assert!(row.timestamp - t >= Duration::minutes(cfg.labeling.min_gap_minutes));
            }
        }
        last = Some((row.machine_id.as_str(), row.timestamp));
    }
}

#[test]
fn test_every_row_gets_a_defined_non_negative_label() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), true);

    let labeled = run_labeling(&cfg).unwrap();

    assert_eq!(labeled.labels.len(), 2 * ROWS_PER_MACHINE);
    assert!(labeled.labels.iter().all(|l| l.is_finite() && *l >= 0.0));
}

#[test]
fn test_labels_count_down_toward_each_event() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), true);

    let labeled = run_labeling(&cfg).unwrap();

    // Rows before the first alpha event measure time to it exactly.
    for i in 0..SPIKE_A {
        let expect = Duration::minutes(10 * (SPIKE_A - i) as i64).num_minutes() as f64 / 1440.0;
        assert!((labeled.labels[i] - expect).abs() < 1e-9, "row {i}");
    }
    // Strictly decreasing inside each inter-event stretch.
    for i in 1..SPIKE_A {
        assert!(labeled.labels[i] < labeled.labels[i - 1]);
    }
    for i in (SPIKE_A + 1)..SPIKE_B {
        assert!(labeled.labels[i] < labeled.labels[i - 1]);
    }
    // The event row itself looks forward to the next event.
    let expect_at_event =
        Duration::minutes(10 * (SPIKE_B - SPIKE_A) as i64).num_minutes() as f64 / 1440.0;
    assert!((labeled.labels[SPIKE_A] - expect_at_event).abs() < 1e-9);
}

#[test]
fn test_quiet_machine_and_tail_get_dataset_median() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), true);

    let labeled = run_labeling(&cfg).unwrap();

    // Expected median from first principles: the defined labels are the
    // alpha rows before SPIKE_B, measuring to the next event.
    let mut defined: Vec<f64> = (0..SPIKE_B)
        .map(|i| {
            let next = if i < SPIKE_A { SPIKE_A } else { SPIKE_B };
            10.0 * (next - i) as f64 / 1440.0
        })
        .collect();
    defined.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let expect_fill = (defined[defined.len() / 2 - 1] + defined[defined.len() / 2]) / 2.0;

    // All beta rows and the alpha tail carry the fill value.
    for i in SPIKE_B..labeled.labels.len() {
        assert!(
            (labeled.labels[i] - expect_fill).abs() < 1e-9,
            "row {i}: {} != {expect_fill}",
            labeled.labels[i]
        );
    }
}

#[test]
fn test_no_events_anywhere_falls_back_to_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_for(dir.path(), false);
    cfg.labeling.sentinel_days = 1234.5;

    let labeled = run_labeling(&cfg).unwrap();

    assert_eq!(labeled.event_count(), 0);
    assert!(labeled.labels.iter().all(|&l| l == 1234.5));
}

#[test]
fn test_relabeling_identical_input_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), true);

    let first = run_labeling(&cfg).unwrap();
    let first_csv = std::fs::read(&cfg.outputs.processed_csv).unwrap();
    let second = run_labeling(&cfg).unwrap();
    let second_csv = std::fs::read(&cfg.outputs.processed_csv).unwrap();

    assert_eq!(first.event_flags, second.event_flags);
    assert_eq!(first.labels, second.labels);
    assert_eq!(first_csv, second_csv);
}

#[test]
fn test_sqlite_staging_matches_direct_path() {
    let dir = tempfile::tempdir().unwrap();
    let direct_cfg = config_for(dir.path(), true);

    let staged_dir = tempfile::tempdir().unwrap();
    let mut staged_cfg = config_for(staged_dir.path(), true);
    staged_cfg.data.use_db = true;

    let direct = run_labeling(&direct_cfg).unwrap();
    let staged = run_labeling(&staged_cfg).unwrap();

    assert_eq!(direct.event_flags, staged.event_flags);
    assert_eq!(direct.labels, staged.labels);
}

#[test]
fn test_full_experiment_produces_summary_and_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), true);

    let summary = run_experiment(&cfg).unwrap();

    assert_eq!(summary.rows, 2 * ROWS_PER_MACHINE);
    assert_eq!(summary.machines, 2);
    assert_eq!(summary.events, 2);
    assert!(!summary.scratch_diverged);
    assert_eq!(summary.scratch.model_type, "scratch");
    assert!(summary.scratch.rmse.is_finite());

    let processed = std::fs::read_to_string(&cfg.outputs.processed_csv).unwrap();
    assert_eq!(processed.lines().count(), 2 * ROWS_PER_MACHINE + 1);

    // One header + one row per model.
    let results = std::fs::read_to_string(&cfg.outputs.results_csv).unwrap();
    assert_eq!(results.lines().count(), 3);

    // A second run appends without repeating the header.
    run_experiment(&cfg).unwrap();
    let results = std::fs::read_to_string(&cfg.outputs.results_csv).unwrap();
    assert_eq!(results.lines().count(), 5);
}
