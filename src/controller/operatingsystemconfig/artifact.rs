//! # Artifact Secret
//!
//! Persists the generated cloud config into a Secret owned by the
//! OperatingSystemConfig.
//!
//! Only the cloud config data key and the controller owner reference are
//! touched; other keys, labels and owner references written by someone else
//! survive. Deleting the Secret is left to the Kubernetes garbage collector,
//! which removes it once its controlling OperatingSystemConfig is gone.

use crate::constants::{ARTIFACT_NAME_PREFIX, MAX_CONFLICT_RETRIES};
use crate::crd::OperatingSystemConfig;
use crate::error::{Error, Result};
use crate::store::SecretStore;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Name and namespace of the artifact Secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactIdentity {
    pub name: String,
    pub namespace: String,
}

impl std::fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// What [`upsert_artifact`] did to the Secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactWrite {
    Created,
    Updated,
    Unchanged,
}

/// Identity of the artifact for `config`
///
/// The reference recorded in status wins so a Secret, once created, keeps its
/// name. Otherwise the name is derived from the config name.
///
/// # Errors
///
/// [`Error::MissingMetadata`] if the config has no namespace.
pub fn artifact_identity(config: &OperatingSystemConfig) -> Result<ArtifactIdentity> {
    if let Some(cloud_config) = config.status.as_ref().and_then(|s| s.cloud_config.as_ref()) {
        return Ok(ArtifactIdentity {
            name: cloud_config.secret_ref.name.clone(),
            namespace: cloud_config.secret_ref.namespace.clone(),
        });
    }

    let namespace = config
        .namespace()
        .ok_or(Error::MissingMetadata("metadata.namespace"))?;
    Ok(ArtifactIdentity {
        name: format!("{ARTIFACT_NAME_PREFIX}{}", config.name_any()),
        namespace,
    })
}

/// Controller owner reference pointing at `config`
///
/// # Errors
///
/// [`Error::MissingMetadata`] if the config has no name or uid yet.
pub fn owner_reference(config: &OperatingSystemConfig) -> Result<OwnerReference> {
    config
        .controller_owner_ref(&())
        .ok_or(Error::MissingMetadata("metadata.uid"))
}

/// Set `key` to `payload` and make `owner` the controller of `secret`
///
/// # Errors
///
/// [`Error::AlreadyOwned`] if a different controller already owns the Secret.
pub fn apply_artifact(
    secret: &mut Secret,
    key: &str,
    payload: &[u8],
    owner: &OwnerReference,
) -> Result<()> {
    set_controller_reference(secret, owner)?;
    secret
        .data
        .get_or_insert_with(BTreeMap::new)
        .insert(key.to_string(), ByteString(payload.to_vec()));
    Ok(())
}

fn set_controller_reference(secret: &mut Secret, owner: &OwnerReference) -> Result<()> {
    let name = secret.name_any();
    let refs = secret.metadata.owner_references.get_or_insert_with(Vec::new);

    if let Some(other) = refs
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != owner.uid)
    {
        return Err(Error::AlreadyOwned {
            kind: "Secret".to_string(),
            name,
            owner: format!("{} {}", other.kind, other.name),
        });
    }

    match refs.iter_mut().find(|r| r.uid == owner.uid) {
        Some(existing) => *existing = owner.clone(),
        None => refs.push(owner.clone()),
    }
    Ok(())
}

/// Create or update the artifact Secret
///
/// Reads the latest revision, applies [`apply_artifact`] and writes it back
/// with the read `resourceVersion`. Conflicts re-read and retry; a Secret
/// that already holds the payload is not written again.
///
/// # Errors
///
/// Store errors are returned as-is, [`Error::Conflict`] once retries are exhausted.
pub async fn upsert_artifact(
    store: &dyn SecretStore,
    identity: &ArtifactIdentity,
    key: &str,
    payload: &[u8],
    owner: &OwnerReference,
) -> Result<ArtifactWrite> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = match store.get_secret(&identity.namespace, &identity.name).await? {
            Some(current) => {
                let mut secret = current.clone();
                apply_artifact(&mut secret, key, payload, owner)?;
                if secret == current {
                    debug!("Artifact {} is up to date", identity);
                    return Ok(ArtifactWrite::Unchanged);
                }
                store
                    .replace_secret(&secret)
                    .await
                    .map(|_| ArtifactWrite::Updated)
            }
            None => {
                let mut secret = Secret {
                    metadata: ObjectMeta {
                        name: Some(identity.name.clone()),
                        namespace: Some(identity.namespace.clone()),
                        ..ObjectMeta::default()
                    },
                    ..Secret::default()
                };
                apply_artifact(&mut secret, key, payload, owner)?;
                store
                    .create_secret(&secret)
                    .await
                    .map(|_| ArtifactWrite::Created)
            }
        };

        match result {
            Err(e) if e.is_conflict() && attempt < MAX_CONFLICT_RETRIES => {
                warn!(
                    "Conflict writing artifact {} (attempt {}/{}), retrying with latest revision",
                    identity, attempt, MAX_CONFLICT_RETRIES
                );
            }
            other => return other,
        }
    }
}
