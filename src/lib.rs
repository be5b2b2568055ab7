//! FleetMedic -- Appliance-grade predictive maintenance for robot fleets.
//!
//! This crate provides the core library for sensor-stream ingest,
//! failure-label engineering (rolling anomaly scoring, event debouncing,
//! time-to-next-event horizons), and from-scratch regression training
//! against the engineered label.

pub mod config;
pub mod data;
pub mod eval;
pub mod label;
pub mod storage;
pub mod train;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::config::ExperimentConfig;
use crate::data::SensorTable;
use crate::eval::results::ResultRecord;
use crate::label::{LabelEngine, LabeledTable};
use crate::train::{train_test_split, OlsBaseline, ScratchRegressor};

/// Metrics and fitted parameters for one trained model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub model_type: String,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub weight: f64,
    pub bias: f64,
}

/// Everything a caller needs to inspect after a full experiment run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_tag: String,
    pub rows: usize,
    pub machines: usize,
    pub events: usize,
    pub feature: String,
    pub target: String,
    pub scratch: ModelReport,
    pub baseline: ModelReport,
    pub scratch_final_loss: Option<f64>,
    pub scratch_diverged: bool,
    pub processed_csv: String,
    pub results_csv: String,
}

/// Load, clean, and (optionally) replicate the input dataset per the
/// config. Shared front half of every subcommand.
fn load_and_prepare(cfg: &ExperimentConfig) -> Result<SensorTable> {
    // 1. Load raw CSV
    let raw = data::loader::load_csv(Path::new(&cfg.data.csv_path))?;
    info!(path = %cfg.data.csv_path, rows = raw.rows.len(), "loaded input csv");

    // 2. Clean: parse timestamps, median-fill missing feature values
    let (cleaned, report) = data::clean::clean_table(
        &raw,
        &cfg.columns.machine,
        &cfg.columns.time,
        "robot_1",
    )?;
    info!(
        rows = cleaned.len(),
        dropped = report.dropped_rows,
        filled = report.filled_cells,
        "cleaned dataset"
    );

    // 3. Synthetic fleet replication (single-signal datasets)
    let table = if cfg.data.replicate_fleet {
        let fleet = data::replicate::replicate_fleet(
            &cleaned,
            cfg.data.machine_count,
            cfg.data.noise_std,
            cfg.data.noise_seed,
        );
        info!(machines = cfg.data.machine_count, rows = fleet.len(), "replicated fleet");
        fleet
    } else {
        cleaned
    };

    Ok(table)
}

/// Run the labeling half of the pipeline and write the processed CSV.
pub fn run_labeling(cfg: &ExperimentConfig) -> Result<LabeledTable> {
    let mut table = load_and_prepare(cfg)?;

    // Optional SQLite staging round-trip before labeling
    if cfg.data.use_db {
        let pool = storage::open_pool(&cfg.data.db_path)?;
        let written = storage::seed_readings(&pool, &table)?;
        info!(db = %cfg.data.db_path, rows = written, "staged readings in sqlite");
        table = storage::load_readings(&pool)?;
    }

    let engine = LabelEngine::new(cfg.labeling.clone());
    let labeled = engine
        .label(table, &cfg.columns.feature)
        .context("label engineering failed")?;
    info!(
        rows = labeled.table.len(),
        events = labeled.event_count(),
        "engineered failure labels"
    );

    data::loader::write_processed_csv(
        &labeled,
        &cfg.columns.machine,
        &cfg.columns.time,
        &cfg.columns.target,
        Path::new(&cfg.outputs.processed_csv),
    )?;
    info!(path = %cfg.outputs.processed_csv, "wrote processed csv");

    Ok(labeled)
}

/// Stage the cleaned dataset into SQLite without labeling or training.
pub fn run_ingest(cfg: &ExperimentConfig) -> Result<usize> {
    let table = load_and_prepare(cfg)?;

    let pool = storage::open_pool(&cfg.data.db_path)?;
    let written = storage::seed_readings(&pool, &table)?;
    info!(db = %cfg.data.db_path, rows = written, "ingest complete");
    Ok(written)
}

/// Run the full experiment: label engineering, train/test split, scratch
/// and baseline regressors, evaluation, and result tracking.
pub fn run_experiment(cfg: &ExperimentConfig) -> Result<RunSummary> {
    let labeled = run_labeling(cfg)?;

    // 1. Extract the univariate (feature, label) pair
    let feature_idx = labeled
        .table
        .feature_index(&cfg.columns.feature)
        .context("feature column vanished after labeling")?;
    let x: Vec<f64> = labeled
        .table
        .rows
        .iter()
        .map(|r| r.values[feature_idx])
        .collect();
    let y = labeled.labels.clone();

    // 2. Split
    let split = train_test_split(&x, &y, cfg.split.test_fraction, cfg.split.seed)?;
    info!(
        train = split.x_train.len(),
        test = split.x_test.len(),
        "split dataset"
    );

    // 3. Train the scratch gradient-descent model
    let mut scratch = ScratchRegressor::new(cfg.model.learning_rate, cfg.model.epochs);
    scratch.fit(&split.x_train, &split.y_train)?;
    if scratch.is_diverged() {
        warn!(
            learning_rate = cfg.model.learning_rate,
            "gradient descent diverged; inspect the loss history"
        );
    }
    let scratch_pred = scratch.predict(&split.x_test);

    // 4. Train the closed-form baseline
    let baseline = OlsBaseline::fit(&split.x_train, &split.y_train)?;
    let baseline_pred = baseline.predict(&split.x_test);

    // 5. Evaluate both models on the held-out rows
    let scratch_report = ModelReport {
        model_type: "scratch".to_string(),
        rmse: eval::rmse(&split.y_test, &scratch_pred),
        mae: eval::mae(&split.y_test, &scratch_pred),
        r2: eval::r2(&split.y_test, &scratch_pred),
        weight: scratch.weight(),
        bias: scratch.bias(),
    };
    let baseline_report = ModelReport {
        model_type: "baseline_ols".to_string(),
        rmse: eval::rmse(&split.y_test, &baseline_pred),
        mae: eval::mae(&split.y_test, &baseline_pred),
        r2: eval::r2(&split.y_test, &baseline_pred),
        weight: baseline.slope(),
        bias: baseline.intercept(),
    };

    // 6. Track results
    let recorded_at = chrono::Utc::now().to_rfc3339();
    let records = vec![
        ResultRecord {
            run_tag: cfg.project.run_tag.clone(),
            model_type: scratch_report.model_type.clone(),
            feature: cfg.columns.feature.clone(),
            target: cfg.columns.target.clone(),
            rmse: scratch_report.rmse,
            mae: scratch_report.mae,
            r2: scratch_report.r2,
            learning_rate: Some(cfg.model.learning_rate),
            epochs: Some(cfg.model.epochs),
            notes: "engineered failure target via rolling z-score".to_string(),
            recorded_at: recorded_at.clone(),
        },
        ResultRecord {
            run_tag: cfg.project.run_tag.clone(),
            model_type: baseline_report.model_type.clone(),
            feature: cfg.columns.feature.clone(),
            target: cfg.columns.target.clone(),
            rmse: baseline_report.rmse,
            mae: baseline_report.mae,
            r2: baseline_report.r2,
            learning_rate: None,
            epochs: None,
            notes: "closed-form ols baseline".to_string(),
            recorded_at,
        },
    ];
    eval::results::append_results(Path::new(&cfg.outputs.results_csv), &records)?;
    info!(path = %cfg.outputs.results_csv, "appended results");

    Ok(RunSummary {
        run_tag: cfg.project.run_tag.clone(),
        rows: labeled.table.len(),
        machines: labeled.table.machine_count(),
        events: labeled.event_count(),
        feature: cfg.columns.feature.clone(),
        target: cfg.columns.target.clone(),
        scratch: scratch_report,
        baseline: baseline_report,
        scratch_final_loss: scratch.history().last().copied(),
        scratch_diverged: scratch.is_diverged(),
        processed_csv: cfg.outputs.processed_csv.clone(),
        results_csv: cfg.outputs.results_csv.clone(),
    })
}
