//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! Values that operators may want to change are exposed through
//! [`crate::config::ControllerConfig`] as well.

/// Field manager recorded on objects written by the controller
pub const FIELD_MANAGER: &str = "os-config-controller";

/// Finalizer placed on OperatingSystemConfig resources
pub const OSC_FINALIZER: &str = "extensions.gardener.cloud/os-config-controller";

/// OperatingSystemConfig type handled by default
pub const DEFAULT_OS_TYPE: &str = "coreos-alibaba";

/// Directory systemd units and their drop-ins are written to
pub const DEFAULT_UNITS_PATH: &str = "/etc/systemd/system";

/// Prefix of the artifact Secret name derived from the config name
pub const ARTIFACT_NAME_PREFIX: &str = "osc-result-";

/// Data key holding the generated cloud config inside the artifact Secret
pub const CLOUD_CONFIG_DATA_KEY: &str = "cloud_config";

/// Permissions applied to files that do not specify any
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o644;

/// Progress reported with a failed last operation
pub const ERROR_PROGRESS: i32 = 50;

/// Progress reported with a successful last operation
pub const SUCCESS_PROGRESS: i32 = 100;

/// Attempts to write the artifact when the stored Secret keeps changing underneath
pub const MAX_CONFLICT_RETRIES: usize = 5;

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default requeue interval after a successful reconcile (seconds)
pub const DEFAULT_RESYNC_SECS: u64 = 300;

/// Default backoff bounds for failed reconciliations (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default delay before restarting the watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;
