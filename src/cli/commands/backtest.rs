//! Backtest command implementation.

use anyhow::{Context, Result};
use smc_backtest::BacktestEngine;
use smc_config::AppConfig;
use smc_data::load_csv;
use smc_strategies::StrategyRegistry;
use tracing::info;

use super::strategy_params;
use crate::cli::{symbol_from_path, BacktestArgs, OutputFormat};

pub async fn run(args: BacktestArgs, app: &AppConfig) -> Result<()> {
    // Reject bad requests before touching the data
    let registry = StrategyRegistry::new();
    let params = strategy_params(app, &args.strategy, args.params.as_deref())?;
    let strategy = registry.create(&args.strategy, params)?;
    let engine = BacktestEngine::new(args.engine.apply(app.backtest.clone()))?;

    let symbol = args
        .symbol
        .clone()
        .unwrap_or_else(|| symbol_from_path(&args.data));
    let series = load_csv(&args.data, &symbol)
        .await
        .with_context(|| format!("Failed to load {}", args.data.display()))?;

    let report = engine.run(strategy.as_ref(), &series)?;

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(path) = &args.save {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }

    if let Some(path) = &args.valuations_csv {
        std::fs::write(path, report.valuations_to_csv())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Valuations saved");
    }

    if let Some(path) = &args.trades_csv {
        std::fs::write(path, report.trades_to_csv())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Trade log saved");
    }

    Ok(())
}
