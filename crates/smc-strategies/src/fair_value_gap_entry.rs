//! Fair Value Gap Entry Strategy.
//!
//! Enters when price retraces into the most recent unfilled gap by at least
//! `entry_fill_ratio` of its height without closing through it. Each gap
//! triggers at most one signal; once used it is marked filled.

use serde::{Deserialize, Serialize};
use smc_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig},
    types::{Bar, BarSeries, Exposure, Signal},
};
use smc_patterns::{identify_fair_value_gaps, FairValueGap};
use tracing::{debug, warn};

/// Configuration for the Fair Value Gap Entry strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FairValueGapEntryConfig {
    /// Fraction of the gap height price must retrace before entering
    pub entry_fill_ratio: f64,
}

impl Default for FairValueGapEntryConfig {
    fn default() -> Self {
        Self {
            entry_fill_ratio: 0.1,
        }
    }
}

impl StrategyConfig for FairValueGapEntryConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if !(0.0..=1.0).contains(&self.entry_fill_ratio) {
            return Err(StrategyError::InvalidConfig(
                "entry_fill_ratio must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

/// Fair Value Gap Entry strategy.
#[derive(Debug, Clone, Default)]
pub struct FairValueGapEntry {
    config: FairValueGapEntryConfig,
}

/// A decision taken on one bar: the signal, the exposure after it and the
/// gap it consumed.
type Fill = (Signal, Exposure, usize);

impl FairValueGapEntry {
    /// Create a new Fair Value Gap Entry strategy.
    pub fn new(config: FairValueGapEntryConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &FairValueGapEntryConfig {
        &self.config
    }

    /// Price a bar's low must reach to count as a retrace into a bullish gap.
    fn bullish_trigger(&self, gap: &FairValueGap) -> f64 {
        gap.high - gap.range() * self.config.entry_fill_ratio
    }

    /// Price a bar's high must reach to count as a retrace into a bearish gap.
    fn bearish_trigger(&self, gap: &FairValueGap) -> f64 {
        gap.low + gap.range() * self.config.entry_fill_ratio
    }

    fn decide(
        &self,
        bar: &Bar,
        exposure: Exposure,
        gaps: &[FairValueGap],
        bullish: Option<usize>,
        bearish: Option<usize>,
    ) -> Option<Fill> {
        let open = |idx: Option<usize>| idx.filter(|&i| !gaps[i].is_filled());
        let (bullish, bearish) = (open(bullish), open(bearish));

        if exposure != Exposure::Long {
            if let Some(i) = bullish {
                let gap = &gaps[i];
                if bar.low <= self.bullish_trigger(gap) && bar.low >= gap.low {
                    return Some((Signal::Buy, Exposure::Long, i));
                }
            }
        }

        if exposure != Exposure::Short {
            if let Some(i) = bearish {
                let gap = &gaps[i];
                if bar.high >= self.bearish_trigger(gap) && bar.high <= gap.high {
                    return Some((Signal::Sell, Exposure::Short, i));
                }
            }
        }

        match exposure {
            Exposure::Long => bearish
                .filter(|&i| bar.high >= self.bearish_trigger(&gaps[i]))
                .map(|i| (Signal::Sell, Exposure::Flat, i)),
            Exposure::Short => bullish
                .filter(|&i| bar.low <= self.bullish_trigger(&gaps[i]))
                .map(|i| (Signal::Buy, Exposure::Flat, i)),
            Exposure::Flat => None,
        }
    }

    /// Generate signals and return the gaps with the fill state the run
    /// left them in.
    pub fn signals_with_gaps(&self, series: &BarSeries) -> (Vec<Signal>, Vec<FairValueGap>) {
        let mut signals = vec![Signal::Hold; series.len()];

        if !self.has_enough_bars(series.len()) {
            warn!(
                strategy = self.name(),
                bars = series.len(),
                required = self.min_bars(),
                "Series too short, emitting hold signals"
            );
            return (signals, Vec::new());
        }

        // Detection yields fresh gaps each call, so fill marks never leak
        // between runs.
        let mut gaps = identify_fair_value_gaps(series);

        // Gaps are ordered by their third candle; one is tradable only on
        // bars strictly after it.
        let mut cursor = 0;
        let mut bullish: Option<usize> = None;
        let mut bearish: Option<usize> = None;
        let mut exposure = Exposure::Flat;

        for (signal, bar) in signals.iter_mut().zip(series.iter()) {
            while cursor < gaps.len() && gaps[cursor].end_time < bar.timestamp {
                if gaps[cursor].is_bullish {
                    bullish = Some(cursor);
                } else {
                    bearish = Some(cursor);
                }
                cursor += 1;
            }

            if let Some((next_signal, next_exposure, used)) =
                self.decide(bar, exposure, &gaps, bullish, bearish)
            {
                *signal = next_signal;
                exposure = next_exposure;
                gaps[used].filled_time = Some(bar.timestamp);
            }
        }

        debug!(
            strategy = self.name(),
            gaps = gaps.len(),
            filled = gaps.iter().filter(|g| g.is_filled()).count(),
            "Generated signals"
        );

        (signals, gaps)
    }
}

impl Strategy for FairValueGapEntry {
    fn name(&self) -> &str {
        "FairValueGapEntry"
    }

    fn description(&self) -> &str {
        "Enters on a partial retrace into the latest unfilled fair value gap"
    }

    fn generate_signals(&self, series: &BarSeries) -> Vec<Signal> {
        self.signals_with_gaps(series).0
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "entry_fill_ratio": self.config.entry_fill_ratio,
        })
    }
}
