//! Compare command: every registered strategy over the same series.

use anyhow::{Context, Result};
use smc_backtest::{BacktestEngine, BacktestReport};
use smc_config::AppConfig;
use smc_data::load_csv;
use smc_strategies::StrategyRegistry;
use std::sync::Arc;
use tracing::info;

use super::strategy_params;
use crate::cli::{symbol_from_path, CompareArgs, OutputFormat};

pub async fn run(args: CompareArgs, app: &AppConfig) -> Result<()> {
    let registry = StrategyRegistry::new();
    let config = args.engine.apply(app.backtest.clone());
    config.validate()?;

    let symbol = args
        .symbol
        .clone()
        .unwrap_or_else(|| symbol_from_path(&args.data));
    let series = Arc::new(
        load_csv(&args.data, &symbol)
            .await
            .with_context(|| format!("Failed to load {}", args.data.display()))?,
    );

    // One engine per run; runs share nothing but the read-only series.
    let mut handles = Vec::new();
    for name in registry.names() {
        let strategy = registry.create(name, strategy_params(app, name, None)?)?;
        let engine = BacktestEngine::new(config.clone())?;
        let series = Arc::clone(&series);
        handles.push(tokio::task::spawn_blocking(move || {
            engine.run(strategy.as_ref(), &series)
        }));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await.context("Backtest task failed")??);
    }
    info!(runs = reports.len(), symbol = %symbol, "Comparison complete");

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text => println!("{}", comparison_table(&reports)),
    }

    Ok(())
}

fn comparison_table(reports: &[BacktestReport]) -> String {
    let mut s = String::new();

    s.push_str("═══════════════════════════════════════════════════════════════════════════\n");
    s.push_str(&format!(
        "  {:<20} {:>14} {:>10} {:>10} {:>8} {:>8}\n",
        "Strategy", "Final Value", "Return %", "Max DD %", "Sharpe", "Trades"
    ));
    s.push_str("───────────────────────────────────────────────────────────────────────────\n");

    for report in reports {
        let stats = &report.stats;
        s.push_str(&format!(
            "  {:<20} {:>14.2} {:>10.2} {:>10.2} {:>8.2} {:>8}\n",
            report.strategy,
            stats.final_portfolio_value,
            stats.total_return_pct,
            stats.max_drawdown_pct,
            stats.sharpe_ratio,
            stats.num_closed_trades
        ));
    }

    s.push_str("═══════════════════════════════════════════════════════════════════════════\n");
    s
}
