//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::cloudinit::{CloudInitGenerator, MissingUnitContent};
use std::time::Duration;
use tracing::warn;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// OperatingSystemConfig `spec.type` handled by this controller (`OS_TYPE`)
    pub os_type: String,
    /// Directory units are placed in on the machine (`UNITS_PATH`)
    pub units_path: String,
    /// Rendering of units that only carry drop-ins (`MISSING_UNIT_CONTENT`: keep|omit)
    pub missing_unit_content: MissingUnitContent,
    /// Port of the metrics and probe server (`METRICS_PORT`)
    pub metrics_port: u16,
    /// Requeue interval after a successful reconcile (`RESYNC_SECS`)
    pub resync_secs: u64,
    /// Backoff start after a failed reconcile (`BACKOFF_MIN_SECS`)
    pub backoff_min_secs: u64,
    /// Backoff cap after repeated failures (`BACKOFF_MAX_SECS`)
    pub backoff_max_secs: u64,
    /// Delay before restarting an ended watch stream (`WATCH_RESTART_DELAY_SECS`)
    pub watch_restart_delay_secs: u64,
    /// Log filter used when `RUST_LOG` is unset (`LOG_LEVEL`)
    pub log_level: String,
    /// Log format, json or text (`LOG_FORMAT`)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            os_type: DEFAULT_OS_TYPE.to_string(),
            units_path: DEFAULT_UNITS_PATH.to_string(),
            missing_unit_content: MissingUnitContent::default(),
            metrics_port: DEFAULT_METRICS_PORT,
            resync_secs: DEFAULT_RESYNC_SECS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let missing_unit_content = match lookup("MISSING_UNIT_CONTENT") {
            Some(value) => value.parse().unwrap_or_else(|e| {
                warn!("Ignoring MISSING_UNIT_CONTENT: {}", e);
                defaults.missing_unit_content
            }),
            None => defaults.missing_unit_content,
        };

        Self {
            os_type: lookup("OS_TYPE").unwrap_or(defaults.os_type),
            units_path: lookup("UNITS_PATH").unwrap_or(defaults.units_path),
            missing_unit_content,
            metrics_port: parse_or(&lookup, "METRICS_PORT", defaults.metrics_port),
            resync_secs: parse_or(&lookup, "RESYNC_SECS", defaults.resync_secs),
            backoff_min_secs: parse_or(&lookup, "BACKOFF_MIN_SECS", defaults.backoff_min_secs),
            backoff_max_secs: parse_or(&lookup, "BACKOFF_MAX_SECS", defaults.backoff_max_secs),
            watch_restart_delay_secs: parse_or(
                &lookup,
                "WATCH_RESTART_DELAY_SECS",
                defaults.watch_restart_delay_secs,
            ),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT").unwrap_or(defaults.log_format),
        }
    }

    /// Cloud-init generator configured for this controller
    #[must_use]
    pub fn generator(&self) -> CloudInitGenerator {
        CloudInitGenerator::new(self.units_path.clone())
            .with_missing_unit_content(self.missing_unit_content)
    }

    #[must_use]
    pub fn resync_duration(&self) -> Duration {
        Duration::from_secs(self.resync_secs)
    }

    #[must_use]
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
