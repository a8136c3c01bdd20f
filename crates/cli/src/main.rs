//! crop-advisor CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;
mod output;

use args::{Cli, Commands};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging: --log-level, then general.log_level from config
    let file_config = AppConfig::load(cli.config.as_deref()).ok();
    let log_level = resolve_log_level(cli.log_level.as_deref(), file_config.as_ref());
    init_logging(&log_level)?;

    // Execute command
    match cli.command {
        Commands::Rank(args) => commands::rank::execute(args, cli.config).await,
        Commands::Batch(args) => commands::batch::execute(args, cli.config).await,
        Commands::Crops(args) => commands::crops::execute(args, cli.config).await,
        Commands::Amend(args) => commands::amend::execute(args, cli.config).await,
        Commands::Alerts(args) => commands::alerts::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.config).await,
    }
}

fn resolve_log_level(flag: Option<&str>, config: Option<&AppConfig>) -> String {
    flag.map(str::to_string)
        .or_else(|| config.map(|c| c.general.log_level.clone()))
        .unwrap_or_else(|| "info".to_string())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
