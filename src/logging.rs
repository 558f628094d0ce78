//! Tracing subscriber setup.
//!
//! Logs are written to stderr so that `docqa ask --json` output on stdout
//! stays machine-readable. `RUST_LOG` takes precedence over the configured
//! level.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match config.format.as_str() {
        "json" => builder
            .json()
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?,
        _ => builder
            .compact()
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?,
    }

    tracing::debug!(level = %config.level, format = %config.format, "logging initialized");
    Ok(())
}
