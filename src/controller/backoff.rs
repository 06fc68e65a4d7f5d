//! # Fibonacci Backoff
//!
//! Progressive backoff for requeueing failed reconciliations. Grows more
//! slowly than exponential backoff.
//!
//! ```rust
//! use os_config_controller::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(5, 60);
//! assert_eq!(backoff.next_backoff_seconds(), 5);
//! assert_eq!(backoff.next_backoff_seconds(), 5);
//! assert_eq!(backoff.next_backoff_seconds(), 10);
//! assert_eq!(backoff.next_backoff_seconds(), 15);
//! ```

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// Fibonacci backoff calculator
///
/// Each backoff is the sum of the previous two, capped at `max_secs`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_secs: u64,
    prev_secs: u64,
    current_secs: u64,
    max_secs: u64,
}

impl FibonacciBackoff {
    /// `min_secs` is used for the first two values; `max_secs` caps the sequence
    ///
    /// A `max_secs` below `min_secs` is raised to `min_secs`.
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs,
            prev_secs: 0,
            current_secs: min_secs,
            max_secs: max_secs.max(min_secs),
        }
    }

    /// Get the next backoff in seconds and advance the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result = self.current_secs;
        let next = self.prev_secs.saturating_add(self.current_secs);
        self.prev_secs = self.current_secs;
        self.current_secs = next.min(self.max_secs);
        result
    }

    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Restart the sequence, e.g. after a successful reconcile
    pub fn reset(&mut self) {
        self.prev_secs = 0;
        self.current_secs = self.min_secs;
    }
}

/// Backoff of a single resource together with its consecutive error count
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.backoff.reset();
        self.error_count = 0;
    }
}

/// Backoff states keyed by resource, e.g. `namespace/name`
#[derive(Debug)]
pub struct BackoffStates {
    min_secs: u64,
    max_secs: u64,
    states: Mutex<HashMap<String, BackoffState>>,
}

impl BackoffStates {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs,
            max_secs,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Count an error for `key` and return `(backoff_seconds, error_count)`
    pub fn record_error(&self, key: &str) -> (u64, u32) {
        match self.states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(key.to_string())
                    .or_insert_with(|| BackoffState::new(self.min_secs, self.max_secs));
                state.increment_error();
                (state.backoff.next_backoff_seconds(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using minimum backoff", e);
                (self.min_secs, 0)
            }
        }
    }

    /// Drop the state of `key`, after success or once the resource is gone
    pub fn forget(&self, key: &str) {
        match self.states.lock() {
            Ok(mut states) => {
                states.remove(key);
            }
            Err(e) => warn!("Failed to lock backoff states: {}", e),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.lock().map(|states| states.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
