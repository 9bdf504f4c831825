//! Backtest statistics.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use smc_core::error::{BacktestError, BacktestResult};
use smc_core::types::Signal;
use statrs::statistics::Statistics;

/// Bars per year used to annualize the Sharpe ratio.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Kind of fill recorded in the trade log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    BuyLong,
    SellLong,
    SellShort,
    CoverShort,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::BuyLong => "buy_long",
            TradeType::SellLong => "sell_long",
            TradeType::SellShort => "sell_short",
            TradeType::CoverShort => "cover_short",
        }
    }
}

/// Record of a single fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub trade_type: TradeType,
    /// Execution price after slippage
    pub price: Decimal,
    pub size: Decimal,
    pub commission: Decimal,
    /// Net of commission for closing fills; zero for opening fills
    pub realized_pnl: Decimal,
    pub cash_after: Decimal,
    pub portfolio_value_after: Decimal,
}

/// Account snapshot taken at the close of every bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRow {
    pub timestamp: DateTime<Utc>,
    pub signal: Signal,
    pub position_qty: Decimal,
    /// Average entry price of the open position, if any
    pub entry_price: Option<Decimal>,
    /// Realized P&L of a position closed on this bar
    pub trade_pnl: Option<Decimal>,
    pub cash: Decimal,
    pub holdings_value: Decimal,
    pub portfolio_value: Decimal,
}

/// Backtest statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestStats {
    /// Initial capital
    pub initial_capital: Decimal,
    /// Portfolio value at the last bar
    pub final_portfolio_value: Decimal,
    /// Sum of realized P&L over closed positions
    pub total_pnl_realized: Decimal,
    /// Total return percentage
    pub total_return_pct: Decimal,
    /// Number of positions closed with non-zero P&L
    pub num_closed_trades: usize,
    /// Number of winning trades
    pub winning_trades: usize,
    /// Number of losing trades
    pub losing_trades: usize,
    /// Win rate percentage
    pub win_rate_pct: Decimal,
    /// Deepest peak-to-trough decline, as a non-positive percentage
    pub max_drawdown_pct: Decimal,
    /// Annualized Sharpe ratio (risk-free rate of 0)
    pub sharpe_ratio: f64,
    /// Number of bars processed
    pub bars_processed: usize,
    /// All fills in execution order
    pub trade_log: Vec<TradeRecord>,
}

impl BacktestStats {
    /// Compute statistics from a finished run.
    pub fn from_run(
        initial_capital: Decimal,
        valuations: &[ValuationRow],
        trade_log: Vec<TradeRecord>,
    ) -> BacktestResult<Self> {
        let final_portfolio_value = valuations
            .last()
            .map(|row| row.portfolio_value)
            .unwrap_or(initial_capital);

        let closed: Vec<Decimal> = valuations.iter().filter_map(|row| row.trade_pnl).collect();
        let total_pnl_realized = closed
            .iter()
            .try_fold(Decimal::ZERO, |acc, pnl| acc.checked_add(*pnl))
            .ok_or(BacktestError::Overflow("realized pnl"))?;
        let winning_trades = closed.iter().filter(|pnl| **pnl > Decimal::ZERO).count();
        let losing_trades = closed.iter().filter(|pnl| **pnl < Decimal::ZERO).count();

        let win_rate_pct = if closed.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::from(winning_trades * 100) / Decimal::from(closed.len())
        };

        let total_return_pct = if initial_capital > Decimal::ZERO {
            percent_change(final_portfolio_value, initial_capital)
                .ok_or(BacktestError::Overflow("total return"))?
        } else {
            Decimal::ZERO
        };

        Ok(Self {
            initial_capital,
            final_portfolio_value,
            total_pnl_realized,
            total_return_pct,
            num_closed_trades: closed.len(),
            winning_trades,
            losing_trades,
            win_rate_pct,
            max_drawdown_pct: max_drawdown_pct(valuations)?,
            sharpe_ratio: sharpe_ratio(valuations),
            bars_processed: valuations.len(),
            trade_log,
        })
    }
}

/// `(value - base) / base * 100`, or `None` on overflow.
fn percent_change(value: Decimal, base: Decimal) -> Option<Decimal> {
    value
        .checked_sub(base)?
        .checked_div(base)?
        .checked_mul(dec!(100))
}

/// Maximum drawdown of the portfolio value series, as a percentage <= 0.
///
/// Rows whose running peak is not positive are skipped.
pub fn max_drawdown_pct(valuations: &[ValuationRow]) -> BacktestResult<Decimal> {
    let mut peak: Option<Decimal> = None;
    let mut worst = Decimal::ZERO;

    for row in valuations {
        let value = row.portfolio_value;
        let running = peak.map_or(value, |p| p.max(value));
        peak = Some(running);

        if running <= Decimal::ZERO {
            continue;
        }
        let drawdown = percent_change(value, running).ok_or(BacktestError::Overflow("drawdown"))?;
        if drawdown < worst {
            worst = drawdown;
        }
    }

    Ok(worst)
}

/// Annualized Sharpe ratio of bar-to-bar portfolio returns.
///
/// Uses the sample standard deviation. Fewer than two returns, zero
/// volatility or a non-finite result all give 0.
pub fn sharpe_ratio(valuations: &[ValuationRow]) -> f64 {
    let returns: Vec<f64> = valuations
        .windows(2)
        .filter(|pair| !pair[0].portfolio_value.is_zero())
        .filter_map(|pair| {
            let prev = pair[0].portfolio_value.to_f64()?;
            let next = pair[1].portfolio_value.to_f64()?;
            Some((next - prev) / prev)
        })
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.iter().mean();
    let std_dev = returns.iter().std_dev();

    if !std_dev.is_finite() || std_dev == 0.0 {
        return 0.0;
    }

    let sharpe = mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt();
    if sharpe.is_finite() {
        sharpe
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: i64, portfolio_value: Decimal, trade_pnl: Option<Decimal>) -> ValuationRow {
        ValuationRow {
            timestamp: DateTime::from_timestamp(day * 86_400, 0).unwrap(),
            signal: Signal::Hold,
            position_qty: Decimal::ZERO,
            entry_price: None,
            trade_pnl,
            cash: portfolio_value,
            holdings_value: Decimal::ZERO,
            portfolio_value,
        }
    }

    #[test]
    fn test_max_drawdown() {
        let rows = vec![
            row(0, dec!(100), None),
            row(1, dec!(120), None),
            row(2, dec!(90), None),
            row(3, dec!(130), None),
            row(4, dec!(117), None),
        ];

        assert_eq!(max_drawdown_pct(&rows).unwrap(), dec!(-25));
    }

    #[test]
    fn test_drawdown_of_rising_series_is_zero() {
        let rows: Vec<_> = (0..5).map(|i| row(i, Decimal::from(100 + i), None)).collect();

        assert_eq!(max_drawdown_pct(&rows).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_drawdown_skips_non_positive_peaks() {
        let rows = vec![row(0, dec!(-10), None), row(1, dec!(-20), None)];

        assert_eq!(max_drawdown_pct(&rows).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_sharpe_needs_two_returns() {
        let rows = vec![row(0, dec!(100), None), row(1, dec!(110), None)];
        assert_eq!(sharpe_ratio(&rows), 0.0);
        assert_eq!(sharpe_ratio(&[]), 0.0);
    }

    #[test]
    fn test_sharpe_flat_series_is_zero() {
        let rows: Vec<_> = (0..10).map(|i| row(i, dec!(100), None)).collect();

        assert_eq!(sharpe_ratio(&rows), 0.0);
    }

    #[test]
    fn test_sharpe_value() {
        // Returns 0.1 and -0.1: mean 0, so Sharpe is 0
        let rows = vec![row(0, dec!(100), None), row(1, dec!(110), None), row(2, dec!(99), None)];
        assert!(sharpe_ratio(&rows).abs() < 1e-12);

        // Returns 0.1 and 0.2: mean 0.15, sample std 0.0707...
        let rows = vec![row(0, dec!(100), None), row(1, dec!(110), None), row(2, dec!(132), None)];
        let expected = 0.15 / (0.005_f64).sqrt() * 252.0_f64.sqrt();
        assert!((sharpe_ratio(&rows) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_from_run() {
        let rows = vec![
            row(0, dec!(1000), None),
            row(1, dec!(1050), Some(dec!(50))),
            row(2, dec!(1030), Some(dec!(-20))),
            row(3, dec!(1100), None),
        ];

        let stats = BacktestStats::from_run(dec!(1000), &rows, Vec::new()).unwrap();

        assert_eq!(stats.final_portfolio_value, dec!(1100));
        assert_eq!(stats.total_pnl_realized, dec!(30));
        assert_eq!(stats.total_return_pct, dec!(10));
        assert_eq!(stats.num_closed_trades, 2);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.win_rate_pct, dec!(50));
        assert_eq!(stats.bars_processed, 4);
        assert!(stats.max_drawdown_pct < Decimal::ZERO);
    }

    #[test]
    fn test_from_run_empty_and_zero_capital() {
        let stats = BacktestStats::from_run(Decimal::ZERO, &[], Vec::new()).unwrap();

        assert_eq!(stats.final_portfolio_value, Decimal::ZERO);
        assert_eq!(stats.total_return_pct, Decimal::ZERO);
        assert_eq!(stats.win_rate_pct, Decimal::ZERO);
        assert_eq!(stats.sharpe_ratio, 0.0);
        assert_eq!(stats.bars_processed, 0);
    }

    #[test]
    fn test_drawdown_overflow_is_an_error() {
        let rows = vec![row(0, Decimal::MAX, None), row(1, -Decimal::MAX, None)];

        assert!(matches!(max_drawdown_pct(&rows), Err(BacktestError::Overflow(_))));
    }

    #[test]
    fn test_trade_type_serde() {
        assert_eq!(serde_json::to_string(&TradeType::CoverShort).unwrap(), "\"cover_short\"");
        assert_eq!(TradeType::SellShort.as_str(), "sell_short");
    }
}
