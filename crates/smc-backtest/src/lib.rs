//! Bar-by-bar backtesting engine and performance metrics.

mod engine;
mod position;
mod report;
mod statistics;

pub use engine::{BacktestConfig, BacktestEngine, ExecutionPrice};
pub use position::PositionState;
pub use report::BacktestReport;
pub use statistics::{
    max_drawdown_pct, sharpe_ratio, BacktestStats, TradeRecord, TradeType, ValuationRow,
    TRADING_DAYS_PER_YEAR,
};
