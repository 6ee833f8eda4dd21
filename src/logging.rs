//! Tracing subscriber setup

use crate::config::LoggingConfig;
use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

fn filter_directive(level: &str, verbose: bool) -> String {
    let level = if verbose { "debug" } else { level };
    format!("warn,meteocast={level}")
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Logs go to stderr so forecast output on stdout stays machine-readable.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directive(&config.level, verbose))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    installed.map_err(|e| anyhow!("Failed to initialise logging: {e}"))
}
