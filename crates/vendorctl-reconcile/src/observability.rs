//! Log output for reconciler runs.
//!
//! The subscriber is installed once per process. Its level filter sits
//! behind a reload handle so a reconfigured provider can change verbosity
//! without reinstalling anything.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};
use vendorctl_config::LoggingConfig;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

static FILTER_HANDLE: OnceLock<FilterHandle> = OnceLock::new();

pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Installs the global subscriber at `level`. `RUST_LOG`, when set and
/// valid, takes precedence. Does nothing if a subscriber already exists.
pub fn init_tracing_with_level(level: &str) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let (filter_layer, handle) = reload::Layer::new(filter);
    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok();
    if installed {
        let _ = FILTER_HANDLE.set(handle);
    }
}

/// Applies the configured level, installing the subscriber on first use.
///
/// Called by [`Provider::configure`](crate::Provider::configure). Embedders
/// that install their own subscriber beforehand keep it untouched.
pub fn configure_logging(logging: &LoggingConfig) {
    if !apply_logging_level(&logging.level) {
        init_tracing_with_level(&logging.level);
    }
}

/// Changes the level of a subscriber installed by this module. Returns
/// `false` if there is none.
pub fn apply_logging_level(level: &str) -> bool {
    FILTER_HANDLE
        .get()
        .is_some_and(|handle| handle.modify(|f| *f = EnvFilter::new(level)).is_ok())
}
