//! # Status
//!
//! Status types shared by the extension resources: last operation, last error
//! and the OperatingSystemConfig specific cloud config reference.

use serde::{Deserialize, Serialize};

/// Status of the OperatingSystemConfig resource
///
/// `last_error` is serialized as `null` when cleared so a merge patch removes it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatingSystemConfigStatus {
    /// Generation of the spec the status was last computed for
    #[serde(default)]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub last_operation: Option<LastOperation>,
    #[serde(default)]
    pub last_error: Option<LastError>,
    /// Reference to the Secret holding the generated cloud config
    /// Set on the first successful reconcile and never cleared afterwards
    #[serde(default)]
    pub cloud_config: Option<CloudConfig>,
    /// Names of the units contained in the generated cloud config
    #[serde(default)]
    pub units: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloudConfig {
    pub secret_ref: SecretReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    pub name: String,
    pub namespace: String,
}

/// Record of the last operation performed on a resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LastOperation {
    #[serde(rename = "type")]
    pub operation_type: LastOperationType,
    pub state: LastOperationState,
    pub description: String,
    /// Progress in percent; 100 on success
    pub progress: i32,
    /// RFC3339 timestamp
    pub last_update_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum LastOperationType {
    Reconcile,
    Delete,
}

impl LastOperationType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LastOperationType::Reconcile => "Reconcile",
            LastOperationType::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum LastOperationState {
    Succeeded,
    Error,
}

/// Last error observed while operating on a resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    pub description: String,
    /// Consecutive failed attempts before this one
    #[serde(default)]
    pub retry_count: u32,
    /// RFC3339 timestamp
    #[serde(default)]
    pub last_update_time: Option<String>,
}
