//! # Controller
//!
//! Reconcilers for the extension resources handled by this controller.
//!
//! - `backoff`: Fibonacci backoff for failed reconciliations
//! - `infrastructure`: Infrastructure provider status writer
//! - `operatingsystemconfig`: OperatingSystemConfig to cloud-init Secret

pub mod backoff;
pub mod infrastructure;
pub mod operatingsystemconfig;

use crate::error::Result;
use async_trait::async_trait;

/// Lifecycle operations of a resource kind, invoked with a snapshot of the resource
///
/// The caller guarantees at most one active operation per resource. The
/// snapshot is mutable so status computed during an operation is visible to
/// the caller afterwards.
#[async_trait]
pub trait Actuator<K>: Send + Sync {
    /// Whether the resource already has its generated result
    async fn exists(&self, resource: &K) -> Result<bool>;

    async fn create(&self, resource: &mut K) -> Result<()>;

    async fn update(&self, resource: &mut K) -> Result<()>;

    async fn delete(&self, resource: &mut K) -> Result<()>;
}
