//! Logging infrastructure.
//!
//! tickpost emits structured `tracing` events; hosts that already install a
//! subscriber need nothing from this module. For standalone tools and tests,
//! [`init_logging`] sets up console output filtered by `RUST_LOG`.

use std::io;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Initialize console logging.
///
/// Uses the `RUST_LOG` environment variable for filtering, defaulting to
/// `info` when unset.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging() -> Result<(), TryInitError> {
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_target(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
}
