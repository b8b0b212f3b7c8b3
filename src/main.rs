mod config;
mod engine;
mod error;
mod feed;
mod growth;
mod manager;
mod models;
mod mortality;
mod sensitivity;
mod stats;
mod temperature;
mod timeline;
mod types;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Directory holding `scenario.toml` and the produced files.
    #[arg(long)]
    scenario_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate the scenario day by day.
    Project,

    /// Re-run the scenario with one parameter varied.
    Sensitivity {
        /// One of `growth`, `feed` or `mortality`.
        #[arg(long)]
        parameter: String,

        /// Variations in percent.
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        variations: Vec<f64>,

        /// Also save the rows of every variation.
        #[arg(long)]
        save_results: bool,
    },

    /// Estimate the days needed to reach a target weight.
    Target {
        #[arg(long)]
        target_weight_g: f64,

        /// Defaults to the mean temperature reading.
        #[arg(long, allow_negative_numbers = true)]
        temperature: Option<f64>,
    },

    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.scenario_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Project => mgr.run_projection()?,
        Command::Sensitivity {
            parameter,
            variations,
            save_results,
        } => mgr.run_sensitivity(&parameter, &variations, save_results)?,
        Command::Target {
            target_weight_g,
            temperature,
        } => {
            let estimate = mgr.estimate_days_to_target(target_weight_g, temperature)?;
            let json = serde_json::to_string(&estimate).context("failed to serialize estimate")?;
            println!("{json}");
        }
        Command::Clean => mgr.clean()?,
    }

    Ok(())
}
