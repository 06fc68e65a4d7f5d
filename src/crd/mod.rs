//! # Custom Resource Definitions
//!
//! CRD types reconciled by the controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - OperatingSystemConfig specification (files, units, drop-ins)
//! - `status.rs` - Last operation/error records and the cloud config reference
//! - `infrastructure.rs` - Infrastructure resource and its provider status

mod infrastructure;
mod spec;
mod status;

pub use infrastructure::{Infrastructure, InfrastructureSpec, InfrastructureStatus};
pub use spec::{
    DropIn, File, FileContent, FileContentInline, FileContentSecretRef, OperatingSystemConfig,
    OperatingSystemConfigSpec, Unit, UnitCommand,
};
pub use status::{
    CloudConfig, LastError, LastOperation, LastOperationState, LastOperationType,
    OperatingSystemConfigStatus, SecretReference,
};
