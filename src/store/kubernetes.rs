//! Kubernetes API backed stores.

use super::{SecretStore, StatusStore};
use crate::constants::FIELD_MANAGER;
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::core::object::HasStatus;
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

/// Stores backed by a [`kube::Client`]
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..PostParams::default()
    }
}

/// 409 is both AlreadyExists on create and a stale resourceVersion on replace
fn store_error(err: kube::Error, object: &str) -> Error {
    match err {
        kube::Error::Api(ref response) if response.code == 409 => {
            Error::Conflict(object.to_string())
        }
        other => Error::Persistence(Box::new(other)),
    }
}

fn namespace_of<K: Resource>(resource: &K) -> Result<String> {
    resource
        .meta()
        .namespace
        .clone()
        .ok_or(Error::MissingMetadata("metadata.namespace"))
}

#[async_trait]
impl SecretStore for KubeStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .map_err(|e| store_error(e, &format!("secret {namespace}/{name}")))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret> {
        let namespace = namespace_of(secret)?;
        let name = secret.name_any();
        debug!("Creating secret {}/{}", namespace, name);
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
        api.create(&post_params(), secret)
            .await
            .map_err(|e| store_error(e, &format!("secret {namespace}/{name}")))
    }

    async fn replace_secret(&self, secret: &Secret) -> Result<Secret> {
        let namespace = namespace_of(secret)?;
        let name = secret.name_any();
        debug!(
            "Replacing secret {}/{} at resourceVersion {:?}",
            namespace,
            name,
            secret.resource_version()
        );
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
        api.replace(&name, &post_params(), secret)
            .await
            .map_err(|e| store_error(e, &format!("secret {namespace}/{name}")))
    }
}

#[async_trait]
impl<K> StatusStore<K> for KubeStore
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + HasStatus
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
    K::Status: Serialize + Send + Sync,
{
    async fn update_status(&self, resource: &K) -> Result<()> {
        let namespace = namespace_of(resource)?;
        let name = resource.name_any();
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);

        // Merge patch: `null` fields (e.g. a cleared lastError) are removed
        let patch = serde_json::json!({
            "status": resource.status()
        });

        api.patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(patch))
            .await
            .map_err(|e| store_error(e, &format!("status of {} {namespace}/{name}", K::kind(&()))))?;
        Ok(())
    }
}
