//! Log subscriber setup for the `gbce` binary.
//!
//! Library crates only emit `tracing` events; installing the subscriber
//! is left to the binary.

use tracing_subscriber::EnvFilter;

use crate::error::CliError;

pub const DEFAULT_FILTER: &str = "gbce=info";

/// Filter from `--log`, else `RUST_LOG`, else [`DEFAULT_FILTER`].
pub fn filter(level: Option<&str>) -> Result<EnvFilter, CliError> {
    match level {
        Some(level) => EnvFilter::try_new(level).map_err(|error| CliError::InvalidLogFilter {
            filter: level.to_owned(),
            reason: error.to_string(),
        }),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the stderr subscriber. Stdout is reserved for command output.
pub fn init(level: Option<&str>) -> Result<(), CliError> {
    let filter = filter(level)?;
    // A subscriber that is already installed stays in place.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
}
