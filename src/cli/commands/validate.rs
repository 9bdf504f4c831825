//! Validate configuration command.

use anyhow::{Context, Result};
use smc_config::AppConfig;
use std::path::Path;

/// Print the configuration that was loaded and validated at startup.
pub async fn run(app: &AppConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("Configuration is valid: {}", config_path.display());
    } else {
        println!("No file at {}, using defaults and environment", config_path.display());
    }
    println!();
    println!("{}", app.to_toml().context("Failed to render configuration")?);

    Ok(())
}
