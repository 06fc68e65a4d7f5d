//! # Status Computation
//!
//! Pure computation of the next OperatingSystemConfig status from the
//! previous one and the outcome of an operation.

use crate::constants::{ERROR_PROGRESS, SUCCESS_PROGRESS};
use crate::crd::{
    LastError, LastOperation, LastOperationState, LastOperationType, OperatingSystemConfigStatus,
};
use chrono::{DateTime, SecondsFormat, Utc};

/// Outcome of a reconcile or delete step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Succeeded { description: String },
    Failed { description: String, progress: i32 },
}

impl OperationOutcome {
    pub fn succeeded(description: impl Into<String>) -> Self {
        OperationOutcome::Succeeded {
            description: description.into(),
        }
    }

    /// Failure with the standard error progress
    pub fn failed(description: impl Into<String>) -> Self {
        OperationOutcome::Failed {
            description: description.into(),
            progress: ERROR_PROGRESS,
        }
    }
}

/// Compute the status after an operation
///
/// Observed generation follows the spec generation on every outcome. The
/// cloud config reference and unit list are carried over unchanged; callers
/// set them after a successful write. `lastError` is cleared on success and
/// its retry count grows across consecutive failures of the same operation.
#[must_use]
pub fn next_status(
    previous: Option<&OperatingSystemConfigStatus>,
    generation: Option<i64>,
    operation_type: LastOperationType,
    outcome: &OperationOutcome,
    now: DateTime<Utc>,
) -> OperatingSystemConfigStatus {
    let mut status = previous.cloned().unwrap_or_default();
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    status.observed_generation = generation;

    match outcome {
        OperationOutcome::Succeeded { description } => {
            status.last_operation = Some(LastOperation {
                operation_type,
                state: LastOperationState::Succeeded,
                description: description.clone(),
                progress: SUCCESS_PROGRESS,
                last_update_time: timestamp,
            });
            status.last_error = None;
        }
        OperationOutcome::Failed {
            description,
            progress,
        } => {
            let previously_failed = status.last_operation.as_ref().is_some_and(|op| {
                op.state == LastOperationState::Error && op.operation_type == operation_type
            });
            let retry_count = match &status.last_error {
                Some(error) if previously_failed => error.retry_count.saturating_add(1),
                _ => 0,
            };

            status.last_operation = Some(LastOperation {
                operation_type,
                state: LastOperationState::Error,
                description: description.clone(),
                progress: *progress,
                last_update_time: timestamp.clone(),
            });
            status.last_error = Some(LastError {
                description: description.clone(),
                retry_count,
                last_update_time: Some(timestamp),
            });
        }
    }

    status
}
