//! Configuration structures.

use serde::{Deserialize, Serialize};
use smc_backtest::BacktestConfig;
use std::collections::BTreeMap;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    /// Per-strategy parameter overrides, keyed by strategy name
    #[serde(default)]
    pub strategy_params: BTreeMap<String, serde_json::Value>,
}

impl AppConfig {
    /// Parameter overrides for a strategy.
    ///
    /// Keys are matched case-insensitively since the loader folds case.
    pub fn strategy_params_for(&self, strategy: &str) -> Option<&serde_json::Value> {
        self.strategy_params
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(strategy))
            .map(|(_, params)| params)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "smc-backtester".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Also write logs to this file
    pub file: Option<String>,
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}
