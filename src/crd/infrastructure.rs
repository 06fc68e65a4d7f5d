//! # Infrastructure
//!
//! Provider infrastructure realized by an external provisioning engine. The
//! controller only records the engine's computed status.

use crate::crd::{LastError, LastOperation};
use serde::{Deserialize, Serialize};

#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Infrastructure",
    group = "extensions.gardener.cloud",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::InfrastructureStatus",
    shortname = "infra",
    printcolumn = r#"{"name":"Type", "type":"string", "jsonPath":".spec.type"}, {"name":"Region", "type":"string", "jsonPath":".spec.region"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureSpec {
    /// Provider type, e.g. `alicloud`
    #[serde(rename = "type")]
    pub provider_type: String,
    pub region: String,
    /// Provider specific desired infrastructure configuration
    #[serde(default)]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub provider_config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureStatus {
    #[serde(default)]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub last_operation: Option<LastOperation>,
    #[serde(default)]
    pub last_error: Option<LastError>,
    /// Provider specific status computed by the provisioning engine
    #[serde(default)]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub provider_status: Option<serde_json::Value>,
}

fn preserve_unknown_fields(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "nullable": true,
        "x-kubernetes-preserve-unknown-fields": true
    })
}
