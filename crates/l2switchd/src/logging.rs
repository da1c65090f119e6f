//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays free for the command stream.
//! `RUST_LOG`, when set, overrides the configured level.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{L2SwitchError, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Builds the level filter, preferring `RUST_LOG` over `level`.
fn env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    parse_filter(level)
}

fn parse_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| L2SwitchError::config(format!("invalid log level '{level}': {e}")))
}

/// Installs the global subscriber.
///
/// Fails if the level is not a valid filter or a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(&config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .try_init(),
    };

    result.map_err(|e| L2SwitchError::config(format!("failed to install log subscriber: {e}")))
}
