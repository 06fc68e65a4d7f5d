//! Commonly used types and traits.

pub use crate::cloudinit::{CloudInitGenerator, MissingUnitContent, ProvisioningModel};
pub use crate::config::ControllerConfig;
pub use crate::controller::infrastructure::{update_provider_status, ProvisioningEngine};
pub use crate::controller::operatingsystemconfig::OperatingSystemConfigActuator;
pub use crate::controller::Actuator;
pub use crate::crd::{Infrastructure, OperatingSystemConfig, OperatingSystemConfigStatus};
pub use crate::error::{Error, Result};
pub use crate::store::{KubeStore, SecretStore, StatusStore};
