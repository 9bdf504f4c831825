//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, LoggingConfig};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use thiserror::Error;

/// Prefix for environment overrides, e.g. `SMC__BACKTEST__COMMISSION_BPS=5`.
pub const ENV_PREFIX: &str = "SMC";

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration from an optional file and the environment.
///
/// A missing file is not an error; every section falls back to its defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, SettingsError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(false));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.backtest
        .validate()
        .map_err(|e| SettingsError::Invalid(e.to_string()))?;

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use smc_backtest::ExecutionPrice;
    use std::path::PathBuf;

    fn write_temp_toml(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("smc-config-{}-{}.toml", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(Some(Path::new("/no/such/config.toml"))).unwrap();

        assert_eq!(config.app.name, "smc-backtester");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.backtest.initial_capital, dec!(100000));
        assert_eq!(config.backtest.commission_bps, dec!(2));
        assert_eq!(config.backtest.slippage_bps, dec!(1));
        assert_eq!(config.backtest.execution_price, ExecutionPrice::Close);
        assert!(config.strategy_params.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let path = write_temp_toml(
            "file",
            r#"
[logging]
level = "debug"
format = "json"

[backtest]
initial_capital = 25000
commission_bps = 5
execution_price = "next_open"

[strategy_params.FairValueGapEntry]
entry_fill_ratio = 0.25
"#,
        );

        let config = load_config(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(config.logging.is_json());
        assert_eq!(config.backtest.initial_capital, dec!(25000));
        assert_eq!(config.backtest.commission_bps, dec!(5));
        // Unset fields keep their defaults
        assert_eq!(config.backtest.slippage_bps, dec!(1));
        assert_eq!(config.backtest.execution_price, ExecutionPrice::NextOpen);

        let params = config.strategy_params_for("FairValueGapEntry").unwrap();
        assert_eq!(params["entry_fill_ratio"], 0.25);
    }

    #[test]
    fn test_invalid_backtest_section() {
        let path = write_temp_toml("invalid", "[backtest]\nslippage_bps = -1\n");

        let result = load_config(Some(&path));
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_to_toml_round_trip() {
        let mut config = AppConfig::default();
        config.backtest.default_position_size = Decimal::from(5);

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[backtest]"));

        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.backtest, config.backtest);
    }
}
