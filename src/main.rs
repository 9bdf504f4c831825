//! SMC backtester CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use smc_config::{load_config, SettingsError};
use smc_core::error::{BacktestError, DataError, StrategyError};
use smc_monitor::setup_logging;
use std::path::Path;
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if is_client_error(&err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
        Err(err) => {
            error!(error = ?err, "Unexpected failure");
            eprintln!("Error: internal failure, see logs for details");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app = load_config(Some(&cli.config))
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    let level = cli
        .log_level
        .map(|level| level.as_str())
        .unwrap_or(app.logging.level.as_str());
    let _guard = setup_logging(
        level,
        cli.json_logs || app.logging.is_json(),
        app.logging.file.as_deref().map(Path::new),
    )
    .context("Failed to initialize logging")?;

    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, &app).await,
        Commands::Compare(args) => cli::commands::compare::run(args, &app).await,
        Commands::Strategies => cli::commands::strategies::run().await,
        Commands::ValidateConfig => cli::commands::validate::run(&app, &cli.config).await,
    }
}

/// Failures caused by the request itself rather than by the system.
fn is_client_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<BacktestError>()
            .is_some_and(BacktestError::is_client_error)
            || cause.is::<DataError>()
            || cause.is::<StrategyError>()
            || cause.is::<SettingsError>()
            || cause.is::<serde_json::Error>()
    })
}
