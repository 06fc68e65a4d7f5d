//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `os_config_reconciliations_total` - Reconciliations by resource kind and operation
//! - `os_config_reconciliation_errors_total` - Failed reconciliations by kind and stage
//! - `os_config_requeues_total` - Requeues scheduled by the error policy, by reason
//! - `os_config_reconciliation_duration_seconds` - Duration of reconciliations
//! - `os_config_status_update_failures_total` - Status writes that failed after a primary error
//! - `os_config_artifacts_written_total` - Artifact Secret writes by result (created, updated, unchanged)

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "os_config_reconciliations_total",
            "Total number of reconciliations",
        ),
        &["kind", "operation"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "os_config_reconciliation_errors_total",
            "Total number of reconciliation errors",
        ),
        &["kind", "stage"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("os_config_requeues_total", "Total number of requeues"),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "os_config_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static STATUS_UPDATE_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "os_config_status_update_failures_total",
        "Total number of status updates that failed after a reconciliation error",
    )
    .expect("Failed to create STATUS_UPDATE_FAILURES_TOTAL metric - this should never happen")
});

static ARTIFACTS_WRITTEN_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "os_config_artifacts_written_total",
            "Total number of artifact Secret writes",
        ),
        &["result"],
    )
    .expect("Failed to create ARTIFACTS_WRITTEN_TOTAL metric - this should never happen")
});

/// Register all metrics with the registry served on `/metrics`
///
/// # Errors
///
/// Fails if called twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(STATUS_UPDATE_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ARTIFACTS_WRITTEN_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_reconciliations(kind: &str, operation: &str) {
    RECONCILIATIONS_TOTAL
        .with_label_values(&[kind, operation])
        .inc();
}

pub fn increment_reconciliation_errors(kind: &str, stage: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[kind, stage])
        .inc();
}

pub fn increment_requeues(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_status_update_failures() {
    STATUS_UPDATE_FAILURES_TOTAL.inc();
}

pub fn increment_artifacts_written(result: &str) {
    ARTIFACTS_WRITTEN_TOTAL.with_label_values(&[result]).inc();
}

/// Gather all registered metric families
#[must_use]
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}
