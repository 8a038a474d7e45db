//! Tracing subscriber setup for applications embedding the store.

use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber.
///
/// The filter comes from `STRAND_LOG` when set, otherwise from
/// `default_filter` (typically `GeneralConfig::log_filter`).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed or the
/// fallback filter does not parse.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_env("STRAND_LOG") {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|error| anyhow::anyhow!("invalid log filter '{default_filter}': {error}"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
