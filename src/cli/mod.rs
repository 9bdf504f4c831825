//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use smc_backtest::{BacktestConfig, ExecutionPrice};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "smc")]
#[command(author, version, about = "Bar-by-bar backtester for order block and fair value gap strategies")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one strategy over a CSV file
    Backtest(BacktestArgs),
    /// Run every registered strategy over the same data
    Compare(CompareArgs),
    /// List available strategies
    Strategies,
    /// Validate and print the effective configuration
    ValidateConfig,
}

/// Engine overrides shared by `backtest` and `compare`.
#[derive(clap::Args)]
pub struct EngineArgs {
    /// Initial capital
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Commission in basis points of traded value
    #[arg(long)]
    pub commission_bps: Option<Decimal>,

    /// Slippage in basis points
    #[arg(long)]
    pub slippage_bps: Option<Decimal>,

    /// Units per entry
    #[arg(long)]
    pub position_size: Option<Decimal>,

    /// Fill at the signal bar's close or the next bar's open (close, next_open)
    #[arg(long)]
    pub execution_price: Option<ExecutionPrice>,
}

impl EngineArgs {
    /// Apply command-line overrides on top of the configured engine settings.
    pub fn apply(&self, mut config: BacktestConfig) -> BacktestConfig {
        if let Some(capital) = self.capital {
            config.initial_capital = capital;
        }
        if let Some(bps) = self.commission_bps {
            config.commission_bps = bps;
        }
        if let Some(bps) = self.slippage_bps {
            config.slippage_bps = bps;
        }
        if let Some(size) = self.position_size {
            config.default_position_size = size;
        }
        if let Some(price) = self.execution_price {
            config.execution_price = price;
        }
        config
    }
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// Data file (CSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Strategy to backtest
    #[arg(short, long)]
    pub strategy: String,

    /// Symbol label (defaults to the file name)
    #[arg(long)]
    pub symbol: Option<String>,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Strategy parameters as a JSON object, merged over configured ones
    #[arg(long)]
    pub params: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Save the full report as JSON
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Save the per-bar valuation table as CSV
    #[arg(long)]
    pub valuations_csv: Option<PathBuf>,

    /// Save the trade log as CSV
    #[arg(long)]
    pub trades_csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct CompareArgs {
    /// Data file (CSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Symbol label (defaults to the file name)
    #[arg(long)]
    pub symbol: Option<String>,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// Symbol label for a data file: its upper-cased stem.
pub fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_uppercase)
        .unwrap_or_else(|| "DATA".to_string())
}
