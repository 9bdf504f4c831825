//! Strategy registry for creating strategies by name.

use crate::{FairValueGapEntry, FairValueGapEntryConfig, OrderBlockEntry, OrderBlockEntryConfig};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use smc_core::{error::StrategyError, traits::Strategy, traits::StrategyConfig};
use std::collections::BTreeMap;

/// Information about a registered strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Registry key, also the strategy's reported name
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Strategy description
    pub description: String,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
}

/// Registry for available strategies, ordered by id.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyInfo>,
}

impl StrategyRegistry {
    /// Create a new strategy registry with all built-in strategies.
    pub fn new() -> Self {
        let mut strategies = BTreeMap::new();

        let mut register = |strategy: &dyn Strategy, name: &str| {
            strategies.insert(
                strategy.name().to_string(),
                StrategyInfo {
                    id: strategy.name().to_string(),
                    name: name.to_string(),
                    description: strategy.description().to_string(),
                    default_config: strategy.parameters(),
                },
            );
        };

        register(&OrderBlockEntry::default(), "Order Block Entry");
        register(&FairValueGapEntry::default(), "Fair Value Gap Entry");

        Self { strategies }
    }

    /// List all available strategies.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().collect()
    }

    /// Get strategy info by id.
    pub fn get(&self, id: &str) -> Option<&StrategyInfo> {
        self.strategies.get(id)
    }

    /// Get all strategy ids.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Create a strategy instance from configuration.
    ///
    /// Missing fields take their defaults; `null` means all defaults.
    pub fn create(
        &self,
        id: &str,
        config: serde_json::Value,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        match id {
            "OrderBlockEntry" => {
                let config: OrderBlockEntryConfig = parse_config(config)?;
                config.validate()?;
                Ok(Box::new(OrderBlockEntry::new(config)))
            }
            "FairValueGapEntry" => {
                let config: FairValueGapEntryConfig = parse_config(config)?;
                config.validate()?;
                Ok(Box::new(FairValueGapEntry::new(config)))
            }
            _ => Err(StrategyError::NotFound(id.to_string())),
        }
    }

    /// Create a strategy with default configuration.
    pub fn create_default(&self, id: &str) -> Result<Box<dyn Strategy>, StrategyError> {
        let info = self
            .get(id)
            .ok_or_else(|| StrategyError::NotFound(id.to_string()))?;
        self.create(id, info.default_config.clone())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_config<C: DeserializeOwned + Default>(
    config: serde_json::Value,
) -> Result<C, StrategyError> {
    if config.is_null() {
        return Ok(C::default());
    }
    serde_json::from_value(config).map_err(|e| StrategyError::InvalidConfig(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_list() {
        let registry = StrategyRegistry::new();

        assert_eq!(registry.list().len(), 2);
        assert_eq!(registry.names(), vec!["FairValueGapEntry", "OrderBlockEntry"]);
    }

    #[test]
    fn test_registry_get() {
        let registry = StrategyRegistry::new();

        let info = registry.get("OrderBlockEntry").unwrap();
        assert_eq!(info.default_config["strength_factor"], 1.2);
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_create_default() {
        let registry = StrategyRegistry::new();

        let strategy = registry.create_default("FairValueGapEntry").unwrap();
        assert_eq!(strategy.name(), "FairValueGapEntry");
        assert_eq!(strategy.min_bars(), 3);
    }

    #[test]
    fn test_create_with_partial_config() {
        let registry = StrategyRegistry::new();

        let strategy = registry
            .create("OrderBlockEntry", serde_json::json!({ "strength_factor": 2.0 }))
            .unwrap();

        assert_eq!(strategy.parameters()["strength_factor"], 2.0);
        assert_eq!(strategy.parameters()["proximity_factor"], 0.001);
    }

    #[test]
    fn test_create_with_null_config() {
        let registry = StrategyRegistry::new();

        let strategy = registry.create("FairValueGapEntry", serde_json::Value::Null).unwrap();
        assert_eq!(strategy.parameters()["entry_fill_ratio"], 0.1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let registry = StrategyRegistry::new();

        let result = registry.create("FairValueGapEntry", serde_json::json!({ "entry_fill_ratio": 2.0 }));
        assert!(matches!(result, Err(StrategyError::InvalidConfig(_))));

        let result = registry.create("OrderBlockEntry", serde_json::json!({ "strength_factor": "high" }));
        assert!(matches!(result, Err(StrategyError::InvalidConfig(_))));
    }

    #[test]
    fn test_create_unknown_strategy() {
        let registry = StrategyRegistry::new();

        let result = registry.create_default("unknown");
        assert!(matches!(result, Err(StrategyError::NotFound(_))));
    }
}
