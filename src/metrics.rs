// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for zonekeeper.
//!
//! All metrics carry the `zonekeeper_` prefix. A one-shot CLI has no scrape
//! endpoint, so the binary prints the text exposition on request
//! (`--print-metrics`) after a run.
//!
//! # Metrics Categories
//!
//! - **Operation Metrics** - Lifecycle operations by resource kind, verb and outcome
//! - **Resource Lifecycle Metrics** - Created, updated and deleted resources
//! - **Poller Metrics** - Individual poll attempts and deadline expiries
//! - **Error Metrics** - Failures by status reason
//!
//! # Example
//!
//! ```rust,no_run
//! use zonekeeper::metrics::record_operation_success;
//!
//! record_operation_success("Zone", "create", std::time::Duration::from_secs(2));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::DnsError;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all zonekeeper metrics
const METRICS_NAMESPACE: &str = "zonekeeper";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Operation Metrics
// ============================================================================

/// Total number of lifecycle operations by resource kind, verb and outcome
///
/// Labels:
/// - `resource_type`: `Zone` or `RecordSet`
/// - `operation`: `create`, `read`, `update`, `delete`, `import`
/// - `status`: `success` or `error`
pub static OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_operations_total"),
        "Total number of lifecycle operations by resource type, operation and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of lifecycle operations in seconds, polling included
pub static OPERATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_operation_duration_seconds"),
        "Duration of lifecycle operations in seconds by resource type and operation",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 300.0]);
    let histogram = HistogramVec::new(opts, &["resource_type", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Resource Lifecycle Metrics
// ============================================================================

/// Total number of resources created
pub static RESOURCES_CREATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_created_total"),
        "Total number of resources created by resource type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of resources updated in place or replaced
pub static RESOURCES_UPDATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_updated_total"),
        "Total number of resources updated by resource type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of resources deleted
pub static RESOURCES_DELETED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_deleted_total"),
        "Total number of resources deleted by resource type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Poller Metrics
// ============================================================================

/// Total number of poll attempts by outcome
///
/// Labels:
/// - `outcome`: `done`, `failed` or `pending`
pub static POLL_ATTEMPTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_poll_attempts_total"),
        "Total number of poll attempts by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of polled operations that hit their deadline
pub static POLL_TIMEOUTS_TOTAL: LazyLock<prometheus::Counter> = LazyLock::new(|| {
    let counter = prometheus::Counter::new(
        format!("{METRICS_NAMESPACE}_poll_timeouts_total"),
        "Total number of polled operations that exceeded their deadline",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by resource type and reason
///
/// Labels:
/// - `resource_type`: `Zone` or `RecordSet`
/// - `reason`: status reason such as `ZoneNotFound` or `OperationTimedOut`
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by resource type and reason",
    );
    let counter = CounterVec::new(opts, &["resource_type", "reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful lifecycle operation
pub fn record_operation_success(resource_type: &str, operation: &str, duration: Duration) {
    OPERATIONS_TOTAL
        .with_label_values(&[resource_type, operation, "success"])
        .inc();
    OPERATION_DURATION_SECONDS
        .with_label_values(&[resource_type, operation])
        .observe(duration.as_secs_f64());
}

/// Record a failed lifecycle operation
///
/// # Arguments
/// * `resource_type` - `Zone` or `RecordSet`
/// * `operation` - Verb that failed
/// * `reason` - Status reason of the error
/// * `duration` - Time spent before the failure
pub fn record_operation_error(
    resource_type: &str,
    operation: &str,
    reason: &str,
    duration: Duration,
) {
    OPERATIONS_TOTAL
        .with_label_values(&[resource_type, operation, "error"])
        .inc();
    OPERATION_DURATION_SECONDS
        .with_label_values(&[resource_type, operation])
        .observe(duration.as_secs_f64());
    ERRORS_TOTAL
        .with_label_values(&[resource_type, reason])
        .inc();
}

/// Record the outcome of a lifecycle operation started at `started`
pub fn record_operation<T>(
    resource_type: &str,
    operation: &str,
    started: Instant,
    result: &Result<T, DnsError>,
) {
    let elapsed = started.elapsed();
    match result {
        Ok(_) => record_operation_success(resource_type, operation, elapsed),
        Err(e) => record_operation_error(resource_type, operation, e.status_reason(), elapsed),
    }
}

/// Record resource creation
pub fn record_resource_created(resource_type: &str) {
    RESOURCES_CREATED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record resource update
pub fn record_resource_updated(resource_type: &str) {
    RESOURCES_UPDATED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record resource deletion
pub fn record_resource_deleted(resource_type: &str) {
    RESOURCES_DELETED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record one poll attempt
pub fn record_poll_attempt(outcome: &str) {
    POLL_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a poll deadline expiry
pub fn record_poll_timeout() {
    POLL_TIMEOUTS_TOTAL.inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
