//! Logging utilities and structured logging support
//!
//! The library only emits through the `log` facade; binaries decide the backend.

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system with a default filter, still overridable by `RUST_LOG`
pub fn init_with_filter(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
