//! Experiment configuration, loaded from a TOML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::label::LabelConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub labeling: LabelConfig,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub outputs: OutputConfig,
}

impl ExperimentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Tag recorded with every results row of this run.
    #[serde(default = "default_run_tag")]
    pub run_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
    /// Replicate a single-machine dataset into a synthetic fleet.
    #[serde(default = "default_true")]
    pub replicate_fleet: bool,
    #[serde(default = "default_machine_count")]
    pub machine_count: usize,
    #[serde(default = "default_noise_std")]
    pub noise_std: f64,
    #[serde(default = "default_seed")]
    pub noise_seed: u64,
    /// Stage the cleaned dataset through SQLite and read it back before
    /// labeling.
    #[serde(default)]
    pub use_db: bool,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default = "default_machine_column")]
    pub machine: String,
    #[serde(default = "default_time_column")]
    pub time: String,
    /// The single predictor feature.
    #[serde(default = "default_feature_column")]
    pub feature: String,
    #[serde(default = "default_target_column")]
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_processed_csv")]
    pub processed_csv: String,
    #[serde(default = "default_results_csv")]
    pub results_csv: String,
}

fn default_run_tag() -> String {
    "baseline_run".to_string()
}

fn default_csv_path() -> String {
    "data/robot_stream.csv".to_string()
}

fn default_true() -> bool {
    true
}

fn default_machine_count() -> usize {
    3
}

fn default_noise_std() -> f64 {
    0.02
}

fn default_seed() -> u64 {
    42
}

fn default_db_path() -> String {
    "data/fleetmedic.db".to_string()
}

fn default_machine_column() -> String {
    "robot_id".to_string()
}

fn default_time_column() -> String {
    "Time".to_string()
}

fn default_feature_column() -> String {
    "axis_1".to_string()
}

fn default_target_column() -> String {
    "time_to_failure_days".to_string()
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_learning_rate() -> f64 {
    0.01
}

fn default_epochs() -> usize {
    1000
}

fn default_processed_csv() -> String {
    "data/processed/labeled_readings.csv".to_string()
}

fn default_results_csv() -> String {
    "experiments/results.csv".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            run_tag: default_run_tag(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            replicate_fleet: true,
            machine_count: default_machine_count(),
            noise_std: default_noise_std(),
            noise_seed: default_seed(),
            use_db: false,
            db_path: default_db_path(),
        }
    }
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            machine: default_machine_column(),
            time: default_time_column(),
            feature: default_feature_column(),
            target: default_target_column(),
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            seed: default_seed(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            processed_csv: default_processed_csv(),
            results_csv: default_results_csv(),
        }
    }
}
