//! # OperatingSystemConfig Controller
//!
//! Watches OperatingSystemConfig resources of the configured OS type and
//! stores the generated cloud config of each in a Secret owned by it.

use anyhow::Result;
use os_config_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;
    run_watch_loop(init.context, init.server_state).await
}
