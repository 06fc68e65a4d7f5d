//! # Initialization
//!
//! Controller startup: rustls, tracing, metrics, probe server, Kubernetes
//! client and actuator wiring.

use crate::config::ControllerConfig;
use crate::controller::operatingsystemconfig::OperatingSystemConfigActuator;
use crate::observability;
use crate::runtime::reconcile::Context;
use crate::server::{start_server, ServerState};
use crate::store::KubeStore;
use anyhow::{anyhow, Context as _, Result};
use kube::Client;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{error, info};

/// Components the watch loop runs with
pub struct InitializationResult {
    pub context: Arc<Context>,
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field(
                "server_ready",
                &self
                    .server_state
                    .is_ready
                    .load(std::sync::atomic::Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// # Errors
///
/// Fails if the crypto provider, metrics or Kubernetes client cannot be set up.
pub async fn initialize() -> Result<InitializationResult> {
    // Required for rustls 0.23+ before any TLS connection is made
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|provider| anyhow!("Failed to install rustls crypto provider: {provider:?}"))?;

    let config = ControllerConfig::from_env();
    observability::logging::init_tracing(&config);

    info!("Starting OperatingSystemConfig controller");
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        os_type = config.os_type.as_str(),
        units_path = config.units_path.as_str(),
        "Controller configuration loaded"
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState {
        is_ready: Arc::new(AtomicBool::new(false)),
    });
    let server_port = config.metrics_port;
    let server_state_clone = server_state.clone();
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let store = Arc::new(KubeStore::new(client.clone()));
    let actuator = OperatingSystemConfigActuator::new(store.clone(), store, config.generator());
    let context = Arc::new(Context::new(client, Arc::new(actuator), config));

    server_state
        .is_ready
        .store(true, std::sync::atomic::Ordering::Relaxed);
    info!("Controller initialized, watching OperatingSystemConfig resources");

    Ok(InitializationResult {
        context,
        server_state,
    })
}
