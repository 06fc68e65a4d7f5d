//! # OperatingSystemConfig Actuator
//!
//! Drives an OperatingSystemConfig from its spec to a generated cloud config
//! stored in a Secret.
//!
//! Create and update are the same idempotent reconcile:
//!
//! 1. Assemble the files and units and generate the cloud config
//! 2. Upsert the artifact Secret under ownership of the config
//! 3. Record the Secret reference and a successful last operation in status
//!
//! A failing step records a failed last operation and returns the step's
//! error. A status write failing after such an error is only logged, so the
//! caller always sees the original cause.

use super::artifact::{
    artifact_identity, owner_reference, upsert_artifact, ArtifactIdentity, ArtifactWrite,
};
use super::assemble::assemble;
use super::status::{next_status, OperationOutcome};
use crate::cloudinit::CloudInitGenerator;
use crate::constants::CLOUD_CONFIG_DATA_KEY;
use crate::controller::Actuator;
use crate::crd::{CloudConfig, LastOperationType, OperatingSystemConfig, SecretReference};
use crate::error::{Error, Result};
use crate::observability::metrics;
use crate::store::{SecretStore, StatusStore};
use async_trait::async_trait;
use chrono::Utc;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, error, info};

const KIND: &str = "OperatingSystemConfig";

pub struct OperatingSystemConfigActuator {
    secrets: Arc<dyn SecretStore>,
    statuses: Arc<dyn StatusStore<OperatingSystemConfig>>,
    generator: CloudInitGenerator,
}

impl std::fmt::Debug for OperatingSystemConfigActuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatingSystemConfigActuator")
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

/// Generated cloud config together with the units it contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCloudConfig {
    pub content: Vec<u8>,
    pub units: Vec<String>,
}

impl OperatingSystemConfigActuator {
    #[must_use]
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        statuses: Arc<dyn StatusStore<OperatingSystemConfig>>,
        generator: CloudInitGenerator,
    ) -> Self {
        Self {
            secrets,
            statuses,
            generator,
        }
    }

    /// Resolve all content of `config` and render its cloud config
    ///
    /// # Errors
    ///
    /// Content resolution and rendering errors.
    pub async fn generate_cloud_config(
        &self,
        config: &OperatingSystemConfig,
    ) -> Result<GeneratedCloudConfig> {
        let namespace = config
            .namespace()
            .ok_or(Error::MissingMetadata("metadata.namespace"))?;
        let model = assemble(
            self.secrets.as_ref(),
            &namespace,
            &config.spec.files,
            &config.spec.units,
        )
        .await?;

        Ok(GeneratedCloudConfig {
            content: self.generator.generate(&model)?,
            units: self.generator.unit_names(&model),
        })
    }

    async fn reconcile(&self, config: &mut OperatingSystemConfig) -> Result<()> {
        let name = config.name_any();

        let cloud_config = match self.generate_cloud_config(config).await {
            Ok(cloud_config) => cloud_config,
            Err(e) => {
                metrics::increment_reconciliation_errors(KIND, "generate");
                self.record_failure(config, format!("Could not generate cloud config: {e}"))
                    .await;
                return Err(e);
            }
        };
        debug!(
            "Generated cloud config for {} ({} bytes, {} units)",
            name,
            cloud_config.content.len(),
            cloud_config.units.len()
        );

        let identity = match self.apply_secret(config, &cloud_config.content).await {
            Ok(identity) => identity,
            Err(e) => {
                metrics::increment_reconciliation_errors(KIND, "apply_secret");
                self.record_failure(
                    config,
                    format!("Could not apply secret for generated cloud config: {e}"),
                )
                .await;
                return Err(e);
            }
        };

        let mut status = next_status(
            config.status.as_ref(),
            config.metadata.generation,
            LastOperationType::Reconcile,
            &OperationOutcome::succeeded("Successfully generated cloud config"),
            Utc::now(),
        );
        status.cloud_config = Some(CloudConfig {
            secret_ref: SecretReference {
                name: identity.name,
                namespace: identity.namespace,
            },
        });
        status.units = cloud_config.units;
        config.status = Some(status);

        self.statuses.update_status(config).await
    }

    async fn apply_secret(
        &self,
        config: &OperatingSystemConfig,
        content: &[u8],
    ) -> Result<ArtifactIdentity> {
        let identity = artifact_identity(config)?;
        let owner = owner_reference(config)?;
        let written = upsert_artifact(
            self.secrets.as_ref(),
            &identity,
            CLOUD_CONFIG_DATA_KEY,
            content,
            &owner,
        )
        .await?;

        let result = match written {
            ArtifactWrite::Created => "created",
            ArtifactWrite::Updated => "updated",
            ArtifactWrite::Unchanged => "unchanged",
        };
        metrics::increment_artifacts_written(result);
        info!("Cloud config secret {} {}", identity, result);
        Ok(identity)
    }

    /// Record a failed reconcile in status; a failing status write is only logged
    async fn record_failure(&self, config: &mut OperatingSystemConfig, description: String) {
        config.status = Some(next_status(
            config.status.as_ref(),
            config.metadata.generation,
            LastOperationType::Reconcile,
            &OperationOutcome::failed(description),
            Utc::now(),
        ));

        if let Err(e) = self.statuses.update_status(config).await {
            metrics::increment_status_update_failures();
            error!(
                osc = %config.name_any(),
                "Could not update operating system config status after reconcile error: {}",
                e
            );
        }
    }
}

#[async_trait]
impl Actuator<OperatingSystemConfig> for OperatingSystemConfigActuator {
    async fn exists(&self, config: &OperatingSystemConfig) -> Result<bool> {
        Ok(config
            .status
            .as_ref()
            .is_some_and(|s| s.cloud_config.is_some()))
    }

    async fn create(&self, config: &mut OperatingSystemConfig) -> Result<()> {
        metrics::increment_reconciliations(KIND, "create");
        self.reconcile(config).await
    }

    async fn update(&self, config: &mut OperatingSystemConfig) -> Result<()> {
        metrics::increment_reconciliations(KIND, "update");
        self.reconcile(config).await
    }

    /// The Secret itself is removed by the garbage collector through its owner reference
    async fn delete(&self, config: &mut OperatingSystemConfig) -> Result<()> {
        metrics::increment_reconciliations(KIND, "delete");
        config.status = Some(next_status(
            config.status.as_ref(),
            config.metadata.generation,
            LastOperationType::Delete,
            &OperationOutcome::succeeded("Successfully deleted cloud config"),
            Utc::now(),
        ));

        if let Err(e) = self.statuses.update_status(config).await {
            error!(
                osc = %config.name_any(),
                "Could not update operating system config status for deletion: {}",
                e
            );
            return Err(e);
        }
        Ok(())
    }
}
