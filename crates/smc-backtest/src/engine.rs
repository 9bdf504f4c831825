//! Backtesting engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use smc_core::error::{BacktestError, BacktestResult, DataError, StrategyError};
use smc_core::traits::Strategy;
use smc_core::types::{Bar, BarSeries, Signal};
use tracing::{debug, info, warn};

use crate::position::PositionState;
use crate::report::BacktestReport;
use crate::statistics::{BacktestStats, TradeRecord, TradeType, ValuationRow};

/// Which price a bar's signal fills at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPrice {
    /// Close of the signal bar
    #[default]
    Close,
    /// Open of the following bar; signals on the last bar do not fill
    NextOpen,
}

impl std::str::FromStr for ExecutionPrice {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "close" => Ok(ExecutionPrice::Close),
            "next_open" | "next-open" => Ok(ExecutionPrice::NextOpen),
            other => Err(BacktestError::Config(format!(
                "unknown execution price '{other}', expected 'close' or 'next_open'"
            ))),
        }
    }
}

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting cash
    pub initial_capital: Decimal,
    /// Commission in basis points of traded value
    pub commission_bps: Decimal,
    /// Slippage in basis points, always against the trade
    pub slippage_bps: Decimal,
    /// Units per entry
    pub default_position_size: Decimal,
    pub execution_price: ExecutionPrice,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100000),
            commission_bps: dec!(2),
            slippage_bps: dec!(1),
            default_position_size: dec!(1),
            execution_price: ExecutionPrice::Close,
        }
    }
}

impl BacktestConfig {
    /// Commission as a fraction of traded value.
    pub fn commission_rate(&self) -> Decimal {
        self.commission_bps / dec!(10000)
    }

    /// Slippage as a fraction of price.
    pub fn slippage_rate(&self) -> Decimal {
        self.slippage_bps / dec!(10000)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.initial_capital < Decimal::ZERO {
            return Err(BacktestError::Config(
                "initial_capital must not be negative".into(),
            ));
        }
        if self.commission_bps < Decimal::ZERO {
            return Err(BacktestError::Config(
                "commission_bps must not be negative".into(),
            ));
        }
        if self.slippage_bps < Decimal::ZERO {
            return Err(BacktestError::Config(
                "slippage_bps must not be negative".into(),
            ));
        }
        if self.default_position_size <= Decimal::ZERO {
            return Err(BacktestError::Config(
                "default_position_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Account state for a single run.
struct EngineState {
    cash: Decimal,
    position: PositionState,
    trades: Vec<TradeRecord>,
}

impl EngineState {
    fn new(initial_capital: Decimal) -> Self {
        Self {
            cash: initial_capital,
            position: PositionState::default(),
            trades: Vec::new(),
        }
    }

    fn portfolio_value(&self, mark: Decimal) -> BacktestResult<Decimal> {
        checked_add(self.cash, self.position.market_value(mark)?, "portfolio value")
    }

    fn record(
        &mut self,
        timestamp: DateTime<Utc>,
        trade_type: TradeType,
        fill: Fill,
        realized_pnl: Decimal,
        mark: Decimal,
    ) -> BacktestResult<()> {
        let portfolio_value_after = self.portfolio_value(mark)?;
        self.trades.push(TradeRecord {
            timestamp,
            trade_type,
            price: fill.price,
            size: fill.size,
            commission: fill.commission,
            realized_pnl,
            cash_after: self.cash,
            portfolio_value_after,
        });
        Ok(())
    }

    fn valuation(
        &self,
        timestamp: DateTime<Utc>,
        signal: Signal,
        mark: Decimal,
        realized: Decimal,
    ) -> BacktestResult<ValuationRow> {
        let holdings_value = self.position.market_value(mark)?;
        Ok(ValuationRow {
            timestamp,
            signal,
            position_qty: self.position.quantity,
            entry_price: self.position.entry_price(),
            trade_pnl: (!realized.is_zero()).then_some(realized),
            cash: self.cash,
            holdings_value,
            portfolio_value: checked_add(self.cash, holdings_value, "portfolio value")?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Fill {
    price: Decimal,
    size: Decimal,
    commission: Decimal,
}

impl Fill {
    /// Traded value plus commission.
    fn cost(&self) -> BacktestResult<Decimal> {
        checked_add(checked_mul(self.size, self.price, "trade value")?, self.commission, "trade cost")
    }

    /// Traded value less commission.
    fn proceeds(&self) -> BacktestResult<Decimal> {
        checked_sub(checked_mul(self.size, self.price, "trade value")?, self.commission, "trade proceeds")
    }
}

/// Backtesting engine.
///
/// Replays a strategy's signals bar by bar over one instrument, holding at
/// most one position at a time. The engine keeps no state between runs.
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a new backtest engine.
    pub fn new(config: BacktestConfig) -> Result<Self, BacktestError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run a backtest.
    pub fn run(
        &self,
        strategy: &dyn Strategy,
        series: &BarSeries,
    ) -> BacktestResult<BacktestReport> {
        info!(
            strategy = strategy.name(),
            symbol = %series.symbol,
            bars = series.len(),
            execution_price = ?self.config.execution_price,
            "Starting backtest"
        );

        let violations = series.envelope_violations();
        if violations > 0 {
            warn!(
                symbol = %series.symbol,
                violations,
                "Bars with open or close outside their high-low range"
            );
        }

        let signals = strategy.generate_signals(series);
        if signals.len() != series.len() {
            return Err(StrategyError::SignalCountMismatch {
                expected: series.len(),
                actual: signals.len(),
            }
            .into());
        }

        let closes = to_decimals(series.bars(), |bar| bar.close)?;
        let opens = to_decimals(series.bars(), |bar| bar.open)?;

        let mut state = EngineState::new(self.config.initial_capital);
        let mut valuations = Vec::with_capacity(series.len());

        for (i, (bar, &signal)) in series.iter().zip(&signals).enumerate() {
            let mark = closes[i];
            let base_price = match self.config.execution_price {
                ExecutionPrice::Close => Some(mark),
                ExecutionPrice::NextOpen => opens.get(i + 1).copied(),
            };

            let realized = match (signal, base_price) {
                (Signal::Buy, Some(price)) => self.execute_buy(&mut state, bar.timestamp, price, mark)?,
                (Signal::Sell, Some(price)) => self.execute_sell(&mut state, bar.timestamp, price, mark)?,
                (Signal::Buy | Signal::Sell, None) => {
                    debug!(index = i, %signal, "No following bar to fill at, signal skipped");
                    Decimal::ZERO
                }
                (Signal::Hold, _) => Decimal::ZERO,
            };

            valuations.push(state.valuation(bar.timestamp, signal, mark, realized)?);
        }

        let stats = BacktestStats::from_run(self.config.initial_capital, &valuations, state.trades)?;

        info!(
            strategy = strategy.name(),
            final_value = %stats.final_portfolio_value,
            total_return_pct = %stats.total_return_pct.round_dp(2),
            fills = stats.trade_log.len(),
            "Backtest complete"
        );

        Ok(BacktestReport {
            strategy: strategy.name().to_string(),
            parameters: strategy.parameters(),
            symbol: series.symbol.clone(),
            config: self.config.clone(),
            stats,
            valuations,
        })
    }

    fn fill(&self, size: Decimal, price: Decimal) -> BacktestResult<Fill> {
        let value = checked_mul(size, price, "trade value")?;
        let commission = checked_mul(value.abs(), self.config.commission_rate(), "commission")?;
        Ok(Fill {
            price,
            size,
            commission,
        })
    }

    /// Cover any short, then open a long if flat and affordable.
    fn execute_buy(
        &self,
        state: &mut EngineState,
        timestamp: DateTime<Utc>,
        base_price: Decimal,
        mark: Decimal,
    ) -> BacktestResult<Decimal> {
        let price = checked_mul(base_price, Decimal::ONE + self.config.slippage_rate(), "fill price")?;
        let mut realized = Decimal::ZERO;

        if state.position.is_short() {
            let entry = state.position.avg_entry_price;
            let fill = self.fill(state.position.quantity.abs(), price)?;
            let gross = checked_mul(fill.size, checked_sub(entry, price, "realized pnl")?, "realized pnl")?;
            realized = checked_sub(gross, fill.commission, "realized pnl")?;

            state.cash = checked_sub(state.cash, fill.cost()?, "cash")?;
            state.position.reset();
            state.record(timestamp, TradeType::CoverShort, fill, realized, mark)?;
            debug!(%timestamp, %price, pnl = %realized, "Covered short");
        }

        if state.position.is_flat() {
            let fill = self.fill(self.config.default_position_size, price)?;
            let cost = fill.cost()?;

            if state.cash >= cost {
                state.cash = checked_sub(state.cash, cost, "cash")?;
                state.position.add(fill.size, price)?;
                state.record(timestamp, TradeType::BuyLong, fill, Decimal::ZERO, mark)?;
                debug!(%timestamp, %price, size = %fill.size, "Opened long");
            } else {
                debug!(%timestamp, cash = %state.cash, %cost, "Insufficient cash for long entry");
            }
        }

        Ok(realized)
    }

    /// Close any long, then open a short if flat. Shorts are not margin-checked.
    fn execute_sell(
        &self,
        state: &mut EngineState,
        timestamp: DateTime<Utc>,
        base_price: Decimal,
        mark: Decimal,
    ) -> BacktestResult<Decimal> {
        let price = checked_mul(base_price, Decimal::ONE - self.config.slippage_rate(), "fill price")?;
        let mut realized = Decimal::ZERO;

        if state.position.is_long() {
            let entry = state.position.avg_entry_price;
            let fill = self.fill(state.position.quantity, price)?;
            let gross = checked_mul(fill.size, checked_sub(price, entry, "realized pnl")?, "realized pnl")?;
            realized = checked_sub(gross, fill.commission, "realized pnl")?;

            state.cash = checked_add(state.cash, fill.proceeds()?, "cash")?;
            state.position.reset();
            state.record(timestamp, TradeType::SellLong, fill, realized, mark)?;
            debug!(%timestamp, %price, pnl = %realized, "Closed long");
        }

        if state.position.is_flat() {
            let fill = self.fill(self.config.default_position_size, price)?;

            state.cash = checked_add(state.cash, fill.proceeds()?, "cash")?;
            state.position.add(-fill.size, price)?;
            state.record(timestamp, TradeType::SellShort, fill, Decimal::ZERO, mark)?;
            debug!(%timestamp, %price, size = %fill.size, "Opened short");
        }

        Ok(realized)
    }
}

fn checked_add(a: Decimal, b: Decimal, what: &'static str) -> BacktestResult<Decimal> {
    a.checked_add(b).ok_or(BacktestError::Overflow(what))
}

fn checked_sub(a: Decimal, b: Decimal, what: &'static str) -> BacktestResult<Decimal> {
    a.checked_sub(b).ok_or(BacktestError::Overflow(what))
}

fn checked_mul(a: Decimal, b: Decimal, what: &'static str) -> BacktestResult<Decimal> {
    a.checked_mul(b).ok_or(BacktestError::Overflow(what))
}

fn to_decimals(bars: &[Bar], field: impl Fn(&Bar) -> f64) -> Result<Vec<Decimal>, DataError> {
    bars.iter()
        .enumerate()
        .map(|(index, bar)| {
            Decimal::try_from(field(bar)).map_err(|e| DataError::InvalidBar {
                index,
                reason: format!("price not representable as decimal: {e}"),
            })
        })
        .collect()
}
