//! CLI command implementations.

pub mod backtest;
pub mod compare;
pub mod strategies;
pub mod validate;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use smc_config::AppConfig;

/// Strategy parameters: configured values, then `--params` on top.
pub fn strategy_params(app: &AppConfig, strategy: &str, overrides: Option<&str>) -> Result<Value> {
    let mut params = app
        .strategy_params_for(strategy)
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    if let Some(raw) = overrides {
        let overrides: Value = serde_json::from_str(raw).context("--params is not valid JSON")?;
        match (params.as_object_mut(), overrides) {
            (Some(base), Value::Object(extra)) => base.extend(extra),
            (None, _) => bail!("configured parameters for {strategy} are not a table"),
            (_, other) => bail!("--params must be a JSON object, got {other}"),
        }
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_merge() {
        let mut app = AppConfig::default();
        app.strategy_params.insert(
            "orderblockentry".into(),
            json!({ "strength_factor": 1.5, "proximity_factor": 0.002 }),
        );

        let params = strategy_params(&app, "OrderBlockEntry", Some(r#"{"strength_factor": 2.0}"#)).unwrap();

        assert_eq!(params, json!({ "strength_factor": 2.0, "proximity_factor": 0.002 }));
    }

    #[test]
    fn test_params_defaults_and_rejects_non_objects() {
        let app = AppConfig::default();

        assert_eq!(strategy_params(&app, "FairValueGapEntry", None).unwrap(), json!({}));
        assert!(strategy_params(&app, "FairValueGapEntry", Some("[1, 2]")).is_err());
        assert!(strategy_params(&app, "FairValueGapEntry", Some("{oops")).is_err());
    }
}
