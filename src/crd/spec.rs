//! # OperatingSystemConfig Spec
//!
//! Declarative files and systemd units that make up a machine's bootstrap
//! configuration.

use serde::{Deserialize, Serialize};

/// OperatingSystemConfig Custom Resource Definition
///
/// Describes files and units that must be present on a machine. The controller
/// renders them into a cloud-init document and stores it in a Secret that is
/// referenced from the status.
///
/// # Example
///
/// ```yaml
/// apiVersion: extensions.gardener.cloud/v1alpha1
/// kind: OperatingSystemConfig
/// metadata:
///   name: pool-a
///   namespace: shoot--dev--cluster
/// spec:
///   type: coreos-alibaba
///   files:
///   - path: /etc/motd
///     permissions: 420
///     content:
///       inline:
///         data: aGVsbG8=
///         encoding: b64
///   units:
///   - name: kubelet.service
///     content: |
///       [Unit]
///       Description=kubelet
///     dropIns:
///     - name: 10-env.conf
///       content: |
///         [Service]
///         Environment=FOO=bar
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "OperatingSystemConfig",
    group = "extensions.gardener.cloud",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::OperatingSystemConfigStatus",
    shortname = "osc",
    printcolumn = r#"{"name":"Type", "type":"string", "jsonPath":".spec.type"}, {"name":"State", "type":"string", "jsonPath":".status.lastOperation.state"}, {"name":"Secret", "type":"string", "jsonPath":".status.cloudConfig.secretRef.name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct OperatingSystemConfigSpec {
    /// Operating system flavour; only configs of the controller's type are reconciled
    #[serde(rename = "type")]
    pub os_type: String,
    /// Files to write, in order
    #[serde(default)]
    pub files: Vec<File>,
    /// Units to install, in order
    #[serde(default)]
    pub units: Vec<Unit>,
}

/// A file that must be written on the machine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub path: String,
    /// Permission bits; defaults to 0644 when unset
    #[serde(default)]
    pub permissions: Option<u32>,
    pub content: FileContent,
}

/// Where the content of a file comes from
///
/// Exactly one of `inline` and `secret_ref` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<FileContentInline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<FileContentSecretRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileContentInline {
    /// Encoding of `data`; empty means the data is used verbatim
    #[serde(default)]
    pub encoding: String,
    pub data: String,
}

/// Reference to a key of a Secret in the config's namespace
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileContentSecretRef {
    pub name: String,
    pub data_key: String,
}

/// A systemd unit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub name: String,
    /// Main unit file content; absent means the unit file is left as it is
    #[serde(default)]
    pub content: Option<String>,
    /// Whether the unit is enabled (default true)
    #[serde(default)]
    pub enable: Option<bool>,
    /// systemctl command issued for the unit after writing it (default restart)
    #[serde(default)]
    pub command: Option<UnitCommand>,
    #[serde(default)]
    pub drop_ins: Vec<DropIn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UnitCommand {
    Start,
    Restart,
    Stop,
}

impl UnitCommand {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitCommand::Start => "start",
            UnitCommand::Restart => "restart",
            UnitCommand::Stop => "stop",
        }
    }
}

/// Drop-in fragment for a unit, placed in `<unit>.d/<name>`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DropIn {
    pub name: String,
    pub content: String,
}
