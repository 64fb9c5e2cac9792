//! Prometheus metrics endpoint handler.
//!
//! `/metrics` is classified as internal: it bypasses edge authentication so
//! Prometheus can scrape it. Labels are bounded and carry no credentials or
//! user identifiers.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns 200 OK with Prometheus text format:
/// ```text
/// # TYPE http_requests_total counter
/// http_requests_total{service="gateway",method="GET",class="public",status_code="200"} 42
/// ```
#[tracing::instrument(skip_all, name = "gateway.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
