//! Tracing setup for the federation core.
//!
//! The core itself only emits `tracing` events; embedding services call
//! [`init`] once at startup to install a formatting subscriber.

use tracing::Level;

/// Install a stdout tracing subscriber at the given level.
///
/// Safe to call more than once; later calls are no-ops if a global
/// subscriber is already set.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .try_init();
}

/// Install a subscriber at INFO, the default for deployments.
pub fn init_default() {
    init(Level::INFO);
}
