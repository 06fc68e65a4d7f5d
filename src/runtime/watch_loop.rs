//! # Watch Loop
//!
//! Watches OperatingSystemConfig resources and the Secrets they own, and
//! restarts the controller when its stream ends.

use crate::crd::OperatingSystemConfig;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use crate::runtime::reconcile::{reconcile, Context};
use crate::server::ServerState;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube_runtime::{watcher, Controller};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run the controller until a shutdown signal is received
///
/// # Errors
///
/// Currently never fails; stream errors restart the watch.
pub async fn run_watch_loop(
    ctx: Arc<Context>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let configs: Api<OperatingSystemConfig> = Api::all(ctx.client.clone());
    let secrets: Api<Secret> = Api::all(ctx.client.clone());
    let restart_delay = ctx.config.watch_restart_delay_duration();

    let shutdown_state = server_state.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal, initiating graceful shutdown...");
        shutdown_state.is_ready.store(false, Ordering::Relaxed);
    });

    loop {
        if !server_state.is_ready.load(Ordering::Relaxed) {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        info!("Starting controller watch loop...");
        Controller::new(configs.clone(), watcher::Config::default().any_semantic())
            .owns(secrets.clone(), watcher::Config::default())
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, ctx.clone())
            .for_each(|event| async move {
                match event {
                    Ok((object, _)) => debug!("Reconciled {}", object),
                    Err(e) => handle_watch_stream_error(&format!("{e:?}"), restart_delay).await,
                }
            })
            .await;

        if !server_state.is_ready.load(Ordering::Relaxed) {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {}s...",
            restart_delay.as_secs()
        );
        tokio::time::sleep(restart_delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}
