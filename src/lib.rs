//! OperatingSystemConfig Controller Library
//!
//! Reconciles OperatingSystemConfig resources into cloud-init documents stored
//! in Secrets, and records provisioning engine status on Infrastructure
//! resources.
//!
//! ## Quick Start
//!
//! ```rust
//! use os_config_controller::prelude::*;
//! ```

pub mod cloudinit;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod server;
pub mod store;

pub use error::{Error, Result};
