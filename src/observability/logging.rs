//! # Logging
//!
//! Installs the global tracing subscriber.

use crate::config::ControllerConfig;
use tracing_subscriber::EnvFilter;

/// Initialize tracing from `RUST_LOG`, falling back to the configured level
///
/// `LOG_FORMAT=json` emits one JSON object per event, anything else plain text.
pub fn init_tracing(config: &ControllerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("os_config_controller={}", config.log_level)));

    let result = if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if let Err(e) = result {
        // Already initialized, e.g. by an embedding binary
        tracing::warn!("Tracing subscriber init returned error: {}", e);
    }
}
