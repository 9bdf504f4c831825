//! Order Block Entry Strategy.
//!
//! Goes long when price trades back into the most recent bullish order
//! block and short when it trades into the most recent bearish one. An
//! open position is closed when price reaches the opposite block.

use serde::{Deserialize, Serialize};
use smc_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig},
    types::{Bar, BarSeries, Exposure, Signal},
};
use smc_patterns::{identify_order_blocks, OrderBlock, OrderBlockDetector};
use tracing::{debug, warn};

/// Configuration for the Order Block Entry strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderBlockEntryConfig {
    /// Proximity allowance as a fraction of price. Accepted and reported;
    /// touches are detected by range overlap.
    pub proximity_factor: f64,
    /// Body ratio the move candle must exceed for a block to form
    pub strength_factor: f64,
}

impl Default for OrderBlockEntryConfig {
    fn default() -> Self {
        Self {
            proximity_factor: 0.001,
            strength_factor: OrderBlockDetector::DEFAULT_STRENGTH_FACTOR,
        }
    }
}

impl StrategyConfig for OrderBlockEntryConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if !self.strength_factor.is_finite() || self.strength_factor <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "strength_factor must be a positive number".into(),
            ));
        }
        if !self.proximity_factor.is_finite() || self.proximity_factor < 0.0 {
            return Err(StrategyError::InvalidConfig(
                "proximity_factor must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

/// Order Block Entry strategy.
#[derive(Debug, Clone, Default)]
pub struct OrderBlockEntry {
    config: OrderBlockEntryConfig,
}

impl OrderBlockEntry {
    /// Create a new Order Block Entry strategy.
    pub fn new(config: OrderBlockEntryConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &OrderBlockEntryConfig {
        &self.config
    }

    /// First matching rule wins; at most one signal per bar.
    fn decide(
        bar: &Bar,
        exposure: Exposure,
        bullish: Option<&OrderBlock>,
        bearish: Option<&OrderBlock>,
    ) -> (Signal, Exposure) {
        if exposure != Exposure::Long {
            if let Some(block) = bullish {
                if bar.overlaps(block.low, block.high) {
                    return (Signal::Buy, Exposure::Long);
                }
            }
        }

        if exposure != Exposure::Short {
            if let Some(block) = bearish {
                if bar.overlaps(block.low, block.high) {
                    return (Signal::Sell, Exposure::Short);
                }
            }
        }

        match (exposure, bullish, bearish) {
            (Exposure::Long, _, Some(block)) if bar.high >= block.low => {
                (Signal::Sell, Exposure::Flat)
            }
            (Exposure::Short, Some(block), _) if bar.low <= block.high => {
                (Signal::Buy, Exposure::Flat)
            }
            _ => (Signal::Hold, exposure),
        }
    }
}

impl Strategy for OrderBlockEntry {
    fn name(&self) -> &str {
        "OrderBlockEntry"
    }

    fn description(&self) -> &str {
        "Enters when price revisits the most recent order block; exits at the opposite block"
    }

    fn generate_signals(&self, series: &BarSeries) -> Vec<Signal> {
        let mut signals = vec![Signal::Hold; series.len()];

        if !self.has_enough_bars(series.len()) {
            warn!(
                strategy = self.name(),
                bars = series.len(),
                required = self.min_bars(),
                "Series too short, emitting hold signals"
            );
            return signals;
        }

        let blocks = identify_order_blocks(series, self.config.strength_factor);

        // Blocks arrive in start_time order, so a cursor stands in for
        // rescanning the whole list on every bar. A block is known from its
        // own candle onward, and a consumed block stays armed while it is
        // still the most recent one of its side.
        let mut cursor = 0;
        let mut bullish: Option<&OrderBlock> = None;
        let mut bearish: Option<&OrderBlock> = None;
        let mut exposure = Exposure::Flat;

        for (signal, bar) in signals.iter_mut().zip(series.iter()) {
            while let Some(block) = blocks
                .get(cursor)
                .filter(|block| block.start_time <= bar.timestamp)
            {
                if block.is_bullish {
                    bullish = Some(block);
                } else {
                    bearish = Some(block);
                }
                cursor += 1;
            }

            let (next_signal, next_exposure) = Self::decide(bar, exposure, bullish, bearish);
            *signal = next_signal;
            exposure = next_exposure;
        }

        debug!(
            strategy = self.name(),
            blocks = blocks.len(),
            actionable = signals.iter().filter(|s| s.is_actionable()).count(),
            "Generated signals"
        );

        signals
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "proximity_factor": self.config.proximity_factor,
            "strength_factor": self.config.strength_factor,
        })
    }
}
