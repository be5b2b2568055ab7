use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fleetmedic::config::ExperimentConfig;

#[derive(Parser)]
#[command(
    name = "fleetmedic",
    about = "Appliance-grade predictive maintenance for robot fleets",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full experiment (label + train + evaluate)
    Run {
        /// Path to the experiment config
        #[arg(long, default_value = "configs/experiment.toml")]
        config: PathBuf,

        /// JSON summary for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Engineer failure labels and write the processed CSV, no training
    Label {
        /// Path to the experiment config
        #[arg(long, default_value = "configs/experiment.toml")]
        config: PathBuf,
    },

    /// Stage the cleaned dataset into the SQLite database
    Ingest {
        /// Path to the experiment config
        #[arg(long, default_value = "configs/experiment.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, json } => {
            tracing::info!(config = %config.display(), "Starting experiment run");
            let cfg = ExperimentConfig::load(&config)?;
            let summary = fleetmedic::run_experiment(&cfg)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("\n=== RUN COMPLETE: {} ===", summary.run_tag);
                println!("Rows:     {} across {} machines", summary.rows, summary.machines);
                println!("Events:   {} debounced anomaly events", summary.events);
                println!("Feature:  {}  ->  Target: {}", summary.feature, summary.target);
                println!("Processed data: {}", summary.processed_csv);
                println!("Results log:    {}", summary.results_csv);

                println!("\n--- Scratch Model ---");
                println!(
                    "RMSE: {:.6} | MAE: {:.6} | R2: {:.6}",
                    summary.scratch.rmse, summary.scratch.mae, summary.scratch.r2
                );
                println!(
                    "w: {:.6} | b: {:.6}",
                    summary.scratch.weight, summary.scratch.bias
                );
                if summary.scratch_diverged {
                    println!("WARNING: training diverged; lower the learning rate");
                }

                println!("\n--- OLS Baseline ---");
                println!(
                    "RMSE: {:.6} | MAE: {:.6} | R2: {:.6}",
                    summary.baseline.rmse, summary.baseline.mae, summary.baseline.r2
                );
                println!(
                    "coef: {:.6} | intercept: {:.6}\n",
                    summary.baseline.weight, summary.baseline.bias
                );
            }
        }
        Commands::Label { config } => {
            tracing::info!(config = %config.display(), "Running label engineering");
            let cfg = ExperimentConfig::load(&config)?;
            let labeled = fleetmedic::run_labeling(&cfg)?;

            println!("\n=== LABELING COMPLETE ===");
            println!(
                "{} rows labeled, {} events detected",
                labeled.table.len(),
                labeled.event_count()
            );
            println!("Processed data: {}\n", cfg.outputs.processed_csv);
        }
        Commands::Ingest { config } => {
            tracing::info!(config = %config.display(), "Ingesting dataset");
            let cfg = ExperimentConfig::load(&config)?;
            let written = fleetmedic::run_ingest(&cfg)?;

            println!("Staged {} readings in {}", written, cfg.data.db_path);
        }
    }

    Ok(())
}
