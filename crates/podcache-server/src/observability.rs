//! Log output for the server process.
//!
//! The subscriber is installed once at startup with a reloadable filter, so
//! the level read from the config file can be applied after the fact.
//! `RUST_LOG` pins the filter for the life of the process.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

static FILTER: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

const STARTUP_LEVEL: &str = "info";

pub fn init_tracing() {
    let filter = env_filter().unwrap_or_else(|| EnvFilter::new(STARTUP_LEVEL));
    let (filter, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .is_ok();
    if installed {
        let _ = FILTER.set(handle);
    }
}

/// Switch to `cfg.level`. Returns whether the filter changed.
pub fn apply_logging_level(cfg: &LoggingConfig) -> bool {
    if env_pinned() {
        tracing::debug!(level = %cfg.level, "RUST_LOG is set, ignoring configured level");
        return false;
    }
    let Some(handle) = FILTER.get() else {
        return false;
    };
    handle
        .modify(|filter| *filter = EnvFilter::new(&cfg.level))
        .is_ok()
}

fn env_pinned() -> bool {
    std::env::var_os(EnvFilter::DEFAULT_ENV).is_some()
}

fn env_filter() -> Option<EnvFilter> {
    if !env_pinned() {
        return None;
    }
    EnvFilter::try_from_default_env().ok()
}
