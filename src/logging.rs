//! Tracing subscriber setup. `RUST_LOG` overrides the default `info` filter.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok(); // already set (e.g., in tests)
}
