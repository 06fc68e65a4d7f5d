//! # Reconcile
//!
//! Drives the OperatingSystemConfig actuator from watch events. The finalizer
//! keeps the resource around until its delete operation has completed.
//!
//! Only configs of the controller's OS type are created or updated. A config
//! whose type changed while it still carries the finalizer is left to the
//! controller of its new type; this controller only completes its deletion.

use crate::config::ControllerConfig;
use crate::constants::OSC_FINALIZER;
use crate::controller::backoff::BackoffStates;
use crate::controller::Actuator;
use crate::crd::OperatingSystemConfig;
use crate::observability::metrics;
use kube::api::Api;
use kube::{Client, ResourceExt};
use kube_runtime::controller::Action;
use kube_runtime::finalizer::{finalizer, Event};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, Instrument};

#[derive(Debug, thiserror::Error)]
pub enum ReconcilerError {
    #[error("finalizer error: {0}")]
    Finalizer(#[source] Box<kube_runtime::finalizer::Error<crate::Error>>),
    #[error("resource is missing {0}")]
    MissingMetadata(&'static str),
}

/// Shared state of the OperatingSystemConfig controller
pub struct Context {
    pub client: Client,
    pub actuator: Arc<dyn Actuator<OperatingSystemConfig>>,
    pub config: ControllerConfig,
    /// Backoff per `namespace/name`
    pub backoff_states: BackoffStates,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Context {
    #[must_use]
    pub fn new(
        client: Client,
        actuator: Arc<dyn Actuator<OperatingSystemConfig>>,
        config: ControllerConfig,
    ) -> Self {
        let backoff_states = BackoffStates::new(config.backoff_min_secs, config.backoff_max_secs);
        Self {
            client,
            actuator,
            config,
            backoff_states,
        }
    }
}

/// Whether `config` is of the OS type handled by this controller
#[must_use]
pub fn handles_type(config: &OperatingSystemConfig, os_type: &str) -> bool {
    config.spec.os_type == os_type
}

fn has_finalizer(config: &OperatingSystemConfig) -> bool {
    config.finalizers().iter().any(|f| f == OSC_FINALIZER)
}

#[must_use]
pub fn backoff_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

/// Reconcile one OperatingSystemConfig
///
/// # Errors
///
/// Actuator errors, wrapped by the finalizer helper.
pub async fn reconcile(
    obj: Arc<OperatingSystemConfig>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcilerError> {
    let name = obj.name_any();
    let namespace = obj
        .namespace()
        .ok_or(ReconcilerError::MissingMetadata("metadata.namespace"))?;
    let key = backoff_key(&namespace, &name);

    // Without the finalizer there is nothing of ours to clean up either
    if !handles_type(&obj, &ctx.config.os_type) && !has_finalizer(&obj) {
        debug!(
            resource.name = name.as_str(),
            resource.namespace = namespace.as_str(),
            os_type = obj.spec.os_type.as_str(),
            "Skipping reconciliation - operating system type is handled elsewhere"
        );
        ctx.backoff_states.forget(&key);
        return Ok(Action::await_change());
    }

    let span = tracing::info_span!(
        "reconcile",
        resource.kind = "OperatingSystemConfig",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        resource.generation = obj.metadata.generation.unwrap_or(0),
    );
    let start = Instant::now();
    let api: Api<OperatingSystemConfig> = Api::namespaced(ctx.client.clone(), &namespace);
    let actuator = ctx.actuator.as_ref();
    let os_type = ctx.config.os_type.as_str();
    let resync = ctx.config.resync_duration();
    let backoff_states = &ctx.backoff_states;
    let cleanup_key = key.as_str();

    let result = finalizer(&api, OSC_FINALIZER, obj, |event| async move {
        match event {
            Event::Apply(config) => apply(actuator, os_type, resync, &config).await,
            Event::Cleanup(config) => {
                cleanup(actuator, backoff_states, cleanup_key, &config).await
            }
        }
    })
    .instrument(span)
    .await
    .map_err(|e| ReconcilerError::Finalizer(Box::new(e)));

    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    if result.is_ok() {
        ctx.backoff_states.forget(&key);
    }
    result
}

/// Create or update `config`, unless it is of another OS type
///
/// # Errors
///
/// Actuator errors.
pub async fn apply(
    actuator: &dyn Actuator<OperatingSystemConfig>,
    os_type: &str,
    resync: Duration,
    config: &OperatingSystemConfig,
) -> crate::Result<Action> {
    if !handles_type(config, os_type) {
        debug!(
            "Operating system config {} changed to type {}, leaving it to its controller",
            config.name_any(),
            config.spec.os_type
        );
        return Ok(Action::await_change());
    }

    let mut config = config.clone();
    if actuator.exists(&config).await? {
        actuator.update(&mut config).await?;
    } else {
        actuator.create(&mut config).await?;
    }
    info!("Reconciled operating system config {}", config.name_any());
    Ok(Action::requeue(resync))
}

/// Delete `config` and drop its backoff state
///
/// # Errors
///
/// Actuator errors; the backoff state is kept for the retry.
pub async fn cleanup(
    actuator: &dyn Actuator<OperatingSystemConfig>,
    backoff_states: &BackoffStates,
    key: &str,
    config: &OperatingSystemConfig,
) -> crate::Result<Action> {
    let mut config = config.clone();
    actuator.delete(&mut config).await?;
    backoff_states.forget(key);
    info!("Deleted operating system config {}", config.name_any());
    Ok(Action::await_change())
}
