//! Per-bar trading signals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action a strategy requests for a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// Cover any short, then open a long
    Buy,
    /// Close any long, then open a short
    Sell,
    /// No action
    #[default]
    Hold,
}

impl Signal {
    /// Whether this signal asks for a trade.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Signal::Hold)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "buy"),
            Signal::Sell => write!(f, "sell"),
            Signal::Hold => write!(f, "hold"),
        }
    }
}

/// Directional exposure of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exposure {
    #[default]
    Flat,
    Long,
    Short,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"buy\"");
        let parsed: Signal = serde_json::from_str("\"hold\"").unwrap();
        assert_eq!(parsed, Signal::Hold);
    }

    #[test]
    fn test_signal_defaults_to_hold() {
        assert_eq!(Signal::default(), Signal::Hold);
        assert!(!Signal::Hold.is_actionable());
        assert!(Signal::Sell.is_actionable());
        assert_eq!(Signal::Sell.to_string(), "sell");
    }
}
