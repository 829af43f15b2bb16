//! Tracing bootstrap helpers.
//!
//! The crate logs through `tracing`; these helpers install a default
//! subscriber for binaries and examples. Libraries embedding turnkit
//! should install their own subscriber instead.

use tracing_subscriber::EnvFilter;

use crate::error::TurnError;

/// Install a formatting subscriber filtered by `RUST_LOG`, defaulting to
/// `info`. Fails if a global subscriber is already set.
pub fn init_default_tracing() -> Result<(), TurnError> {
    init_tracing("info")
}

/// Install a formatting subscriber with the given default filter
/// directive; `RUST_LOG` still takes precedence when set.
pub fn init_tracing(default_filter: &str) -> Result<(), TurnError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| TurnError::ConfigurationError(format!("failed to install subscriber: {e}")))
}
