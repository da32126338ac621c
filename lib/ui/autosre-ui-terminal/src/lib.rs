//! Command-line surface for the simulator.

pub mod cli;
mod commands;
mod logging;
mod paths;

use anyhow::{Context, Result};
use clap::Parser;

use autosre_domain::SimulatorConfig;

use crate::cli::{Cli, Command};

pub async fn run() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logging::init()?;

    let config_path = paths::config_path(cli.config.clone(), paths::home_dir());
    let config = SimulatorConfig::load_from_path(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let snapshot_path = paths::snapshot_path(cli.snapshot.clone(), &config, paths::home_dir());
    tracing::debug!(
        config = %config_path.display(),
        snapshot = %snapshot_path.display(),
        "resolved paths"
    );

    match cli.command {
        Command::Run(args) => commands::run(&config, &snapshot_path, &args, cli.json).await,
        Command::Status => commands::status(&config, &snapshot_path, cli.json),
        Command::Trigger(args) => commands::trigger(&config, &snapshot_path, &args, cli.json),
        Command::Reset => commands::reset(&config, &snapshot_path),
        Command::Scenarios => commands::scenarios(cli.json),
    }
}
