//! # Cloud-Init
//!
//! Intermediate provisioning model and the cloud-init document generator.
//!
//! The model is fully resolved (all file content is raw bytes) and has no
//! dependency on the CRD types, so it is built once by the assembler and then
//! rendered by [`CloudInitGenerator`].

pub mod encoding;
mod generator;

pub use generator::{CloudInitGenerator, MissingUnitContent};

/// A file with resolved content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub path: String,
    pub content: Vec<u8>,
    pub permissions: u32,
}

/// A systemd unit with resolved content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub name: String,
    /// `None` means the main unit file is not written ("no change"),
    /// which is distinct from `Some` empty content.
    pub content: Option<Vec<u8>>,
    pub drop_ins: Vec<DropIn>,
    pub enable: bool,
    /// systemctl verb issued after the configuration is written
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIn {
    pub name: String,
    pub content: Vec<u8>,
}

/// Ordered files and units to provision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningModel {
    pub files: Vec<File>,
    pub units: Vec<Unit>,
}
