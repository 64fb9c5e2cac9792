//! Metrics definitions for the gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gateway_` prefix for gateway-specific metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! Request counters shared with downstream services (`http_requests_total`,
//! `auth_rejections_total`) are recorded by `common`.
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `operation`: issue, renew, revoke
//! - `outcome`: success, unchanged, rejected, error
//! - `route`: configured upstream prefixes only
//! - `status`: success, error, timeout

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("gateway_upstream_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
                30.000,
            ],
        )
        .map_err(|e| format!("Failed to set upstream request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Session Metrics
// ============================================================================

/// Record a session operation.
///
/// Metric: `gateway_session_operations_total`
/// Labels: `operation`, `outcome`
pub fn record_session_event(operation: &'static str, outcome: &'static str) {
    counter!("gateway_session_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a registry sweep.
///
/// Metrics: `gateway_registry_swept_total`, `gateway_registry_entries`
pub fn record_registry_sweep(removed: usize, remaining: usize) {
    counter!("gateway_registry_swept_total")
        .increment(u64::try_from(removed).unwrap_or(u64::MAX));
    #[allow(clippy::cast_precision_loss)]
    gauge!("gateway_registry_entries").set(remaining as f64);
}

// ============================================================================
// Upstream Metrics
// ============================================================================

/// Record a proxied upstream request.
///
/// Metrics: `gateway_upstream_requests_total`, `gateway_upstream_request_duration_seconds`
/// Labels: `route`, `status`
pub fn record_upstream_request(route: &str, status: &'static str, duration: Duration) {
    histogram!("gateway_upstream_request_duration_seconds",
        "route" => route.to_string(),
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("gateway_upstream_requests_total",
        "route" => route.to_string(),
        "status" => status
    )
    .increment(1);
}
