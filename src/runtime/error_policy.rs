//! # Error Policy
//!
//! Requeue policy for failed reconciliations and classification of watch
//! stream errors.

use crate::crd::OperatingSystemConfig;
use crate::observability::metrics;
use crate::runtime::reconcile::{backoff_key, Context, ReconcilerError};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Requeue a failed resource with its own Fibonacci backoff
pub fn handle_reconciliation_error(
    obj: Arc<OperatingSystemConfig>,
    error: &ReconcilerError,
    ctx: Arc<Context>,
) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();

    error!(
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        "Reconciliation error for {}: {:?}",
        name,
        error
    );
    let (backoff_seconds, error_count) = ctx
        .backoff_states
        .record_error(&backoff_key(&namespace, &name));

    info!(
        "Retrying {} in {}s (error count: {})",
        name, backoff_seconds, error_count
    );
    metrics::increment_requeues("error-backoff");
    Action::requeue(Duration::from_secs(backoff_seconds))
}

/// How the watch loop should treat a controller stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    /// Resource version expired, the watch restarts immediately
    Expired,
    /// Credentials or RBAC rejected the watch
    Unauthorized,
    /// Object gone, normal after deletion
    NotFound,
    Other,
}

#[must_use]
pub fn classify_watch_error(error: &str) -> WatchErrorKind {
    // 404 first: plain text 404 bodies surface inside a WatchFailed chain
    if error.contains("ObjectNotFound") || error.contains("404") || error.contains("not found") {
        WatchErrorKind::NotFound
    } else if error.contains("410")
        || error.contains("too old resource version")
        || error.contains("Expired")
        || error.contains("Gone")
    {
        WatchErrorKind::Expired
    } else if error.contains("401") || error.contains("Unauthorized") {
        WatchErrorKind::Unauthorized
    } else {
        WatchErrorKind::Other
    }
}

/// Log a controller stream error, pausing before further events where it
/// is unlikely to clear up on its own
pub async fn handle_watch_stream_error(error: &str, watch_restart_delay: Duration) {
    match classify_watch_error(error) {
        WatchErrorKind::NotFound => {
            warn!("Object not found (404), may have been deleted: {}", error);
        }
        WatchErrorKind::Expired => {
            warn!("Watch resource version expired (410), watch will restart");
        }
        WatchErrorKind::Unauthorized => {
            error!(
                "Watch authentication failed (401), check the controller's RBAC: {}",
                error
            );
            tokio::time::sleep(watch_restart_delay).await;
        }
        WatchErrorKind::Other => {
            error!("Controller stream error: {}", error);
            tokio::time::sleep(watch_restart_delay).await;
        }
    }
}
