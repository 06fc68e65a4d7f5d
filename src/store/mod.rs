//! # Object Stores
//!
//! Seams between the reconcilers and the Kubernetes API.
//!
//! - [`SecretStore`] reads referenced file content and persists artifacts
//! - [`StatusStore`] writes the status of a reconciled resource
//!
//! [`KubeStore`] implements both against the API server; tests use in-memory
//! implementations.

mod kubernetes;

pub use kubernetes::KubeStore;

use crate::error::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get a secret, `Ok(None)` if it does not exist
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;

    /// Create a secret
    ///
    /// Returns [`crate::Error::Conflict`] if it already exists.
    async fn create_secret(&self, secret: &Secret) -> Result<Secret>;

    /// Replace a secret using the `resourceVersion` carried in its metadata
    ///
    /// Returns [`crate::Error::Conflict`] if the stored object changed since it was read.
    async fn replace_secret(&self, secret: &Secret) -> Result<Secret>;
}

#[async_trait]
pub trait StatusStore<K>: Send + Sync {
    /// Persist the status of `resource`
    async fn update_status(&self, resource: &K) -> Result<()>;
}
