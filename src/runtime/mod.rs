//! # Runtime
//!
//! Wires the actuators into `kube-runtime`: watch loop, finalizer handling,
//! error backoff and startup.

pub mod error_policy;
pub mod initialization;
pub mod reconcile;
pub mod watch_loop;
