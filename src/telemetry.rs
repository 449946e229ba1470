//! Tracing subscriber setup for the service binary.

use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter applied when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber: an `EnvFilter` read from `RUST_LOG`
/// (falling back to [`DEFAULT_FILTER`]) and a fmt layer writing to stderr.
///
/// Load `.env` before calling this so `RUST_LOG` from the file applies.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing() -> eyre::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| eyre::eyre!("failed to install tracing subscriber: {err}"))
}
