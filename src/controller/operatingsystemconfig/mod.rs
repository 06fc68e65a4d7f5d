//! # OperatingSystemConfig Controller
//!
//! Reconciles OperatingSystemConfig resources into cloud-init documents.
//!
//! ## Reconciliation Flow
//!
//! 1. Resolve file content (inline, encoded, or from a Secret key)
//! 2. Assemble the resolved provisioning model
//! 3. Render the cloud-init document
//! 4. Upsert the artifact Secret owned by the config
//! 5. Update status

pub mod actuator;
pub mod artifact;
pub mod assemble;
pub mod content;
pub mod status;

pub use actuator::{GeneratedCloudConfig, OperatingSystemConfigActuator};
pub use artifact::{artifact_identity, upsert_artifact, ArtifactIdentity, ArtifactWrite};
pub use assemble::assemble;
pub use content::resolve_file_content;
pub use status::{next_status, OperationOutcome};
