//! Single-instrument position bookkeeping.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smc_core::error::{BacktestError, BacktestResult};

/// Signed position held by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    /// Number of units (positive for long, negative for short)
    pub quantity: Decimal,
    /// Average entry price; zero when flat
    pub avg_entry_price: Decimal,
}

impl PositionState {
    /// Check if this is a long position.
    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    /// Check if this is a short position.
    pub fn is_short(&self) -> bool {
        self.quantity < Decimal::ZERO
    }

    /// Check if the position is flat.
    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Entry price, if a position is open.
    pub fn entry_price(&self) -> Option<Decimal> {
        (!self.is_flat()).then_some(self.avg_entry_price)
    }

    /// Mark-to-market value at `price` (negative for shorts).
    pub fn market_value(&self, price: Decimal) -> BacktestResult<Decimal> {
        self.quantity
            .checked_mul(price)
            .ok_or(BacktestError::Overflow("holdings value"))
    }

    /// Add a signed quantity at `price`, averaging the entry price.
    ///
    /// Only called with fills in the position's direction or from flat.
    pub fn add(&mut self, quantity: Decimal, price: Decimal) -> BacktestResult<()> {
        let overflow = || BacktestError::Overflow("position entry");

        let new_quantity = self.quantity.checked_add(quantity).ok_or_else(overflow)?;
        if new_quantity.is_zero() {
            self.reset();
            return Ok(());
        }
        let total_cost = self
            .quantity
            .checked_mul(self.avg_entry_price)
            .zip(quantity.checked_mul(price))
            .and_then(|(held, added)| held.checked_add(added))
            .ok_or_else(overflow)?;
        self.avg_entry_price = total_cost.checked_div(new_quantity).ok_or_else(overflow)?;
        self.quantity = new_quantity;
        Ok(())
    }

    /// Close the position entirely.
    pub fn reset(&mut self) {
        self.quantity = Decimal::ZERO;
        self.avg_entry_price = Decimal::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_open_from_flat() {
        let mut position = PositionState::default();
        assert!(position.is_flat());
        assert_eq!(position.entry_price(), None);

        position.add(dec!(10), dec!(102.5)).unwrap();

        assert!(position.is_long());
        assert_eq!(position.entry_price(), Some(dec!(102.5)));
        assert_eq!(position.market_value(dec!(100)).unwrap(), dec!(1000));
    }

    #[test]
    fn test_average_entry() {
        let mut position = PositionState::default();
        position.add(dec!(-10), dec!(100)).unwrap();
        position.add(dec!(-10), dec!(110)).unwrap();

        assert!(position.is_short());
        assert_eq!(position.quantity, dec!(-20));
        assert_eq!(position.avg_entry_price, dec!(105));
        assert_eq!(position.market_value(dec!(100)).unwrap(), dec!(-2000));
    }

    #[test]
    fn test_reset() {
        let mut position = PositionState::default();
        position.add(dec!(5), dec!(50)).unwrap();
        position.reset();

        assert_eq!(position, PositionState::default());
        assert!(position.is_flat());
    }

    #[test]
    fn test_overflow_is_an_error() {
        let mut position = PositionState::default();
        position.add(dec!(10), dec!(100)).unwrap();

        assert!(matches!(
            position.market_value(Decimal::MAX),
            Err(BacktestError::Overflow(_))
        ));
        assert!(matches!(
            position.add(Decimal::MAX, dec!(2)),
            Err(BacktestError::Overflow(_))
        ));
    }
}
