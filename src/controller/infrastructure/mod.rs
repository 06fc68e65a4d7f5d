//! # Infrastructure Controller
//!
//! Records the status an external provisioning engine computes for an
//! Infrastructure resource. The engine realizes the infrastructure; this module
//! only consumes its output.

use crate::crd::{Infrastructure, InfrastructureStatus};
use crate::error::{Error, Result};
use crate::store::StatusStore;
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::Value;
use tracing::debug;

/// External engine that turns infrastructure intent into real resources
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Engine state for one infrastructure, e.g. a handle on its stored state
    type Handle: Send + Sync;

    /// Compute the provider status of the infrastructure described by `config`
    async fn compute_status(&self, handle: &Self::Handle, config: &Value) -> anyhow::Result<Value>;
}

/// Write the engine's computed status as the provider status of `infra`
///
/// `infra` is only modified once the engine succeeded.
///
/// # Errors
///
/// [`Error::ComputeStatus`] if the engine fails, otherwise any status store error.
pub async fn update_provider_status<E: ProvisioningEngine + ?Sized>(
    engine: &E,
    handle: &E::Handle,
    store: &dyn StatusStore<Infrastructure>,
    infra: &mut Infrastructure,
    config: &Value,
) -> Result<()> {
    let provider_status = engine
        .compute_status(handle, config)
        .await
        .map_err(Error::ComputeStatus)?;

    debug!("Computed provider status for infrastructure {}", infra.name_any());
    infra
        .status
        .get_or_insert_with(InfrastructureStatus::default)
        .provider_status = Some(provider_status);
    store.update_status(infra).await
}
