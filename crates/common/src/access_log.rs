//! Access logging and HTTP request metrics.
//!
//! Applied as the outermost layer of every service so that rejections from
//! the authentication and trust filters are logged and counted like any
//! other response. Never alters the response.
//!
//! Metrics: `http_requests_total`, `http_request_duration_seconds`
//! Labels: `service`, `method`, `class`, `status` (plus `status_code` on the
//! counter). `class` is the path classification rather than the raw path,
//! which keeps label cardinality bounded for proxied traffic.

use crate::paths::PathClassifier;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Client address used when nothing better is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// State for [`access_log`].
#[derive(Debug, Clone)]
pub struct AccessLog {
    /// Value of the `service` log field and metric label.
    pub service: &'static str,
    /// Decides the `auth` log field for each path.
    pub classifier: Arc<PathClassifier>,
}

impl AccessLog {
    #[must_use]
    pub fn new(service: &'static str, classifier: Arc<PathClassifier>) -> Self {
        Self {
            service,
            classifier,
        }
    }
}

/// Resolve the originating client address.
///
/// Order: first entry of `X-Forwarded-For`, then `X-Real-IP`, then the
/// transport peer, then [`UNKNOWN_CLIENT`].
#[must_use]
pub fn resolve_client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(client) = forwarded {
        return client.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(client) = real_ip {
        return client.to_string();
    }

    peer.map_or_else(|| UNKNOWN_CLIENT.to_string(), |addr| addr.ip().to_string())
}

/// Middleware that logs request start and completion and records metrics.
pub async fn access_log(
    State(state): State<AccessLog>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();
    let class = state.classifier.classify(&path);
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = resolve_client_address(request.headers(), peer);

    tracing::info!(
        target: "common.access_log",
        service = state.service,
        %method,
        path = %path,
        query = %query,
        client = %client,
        "Request started"
    );

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    tracing::info!(
        target: "common.access_log",
        service = state.service,
        %method,
        path = %path,
        status,
        elapsed_ms = elapsed_millis(elapsed),
        "Request completed"
    );

    record_http_request(state.service, method.as_str(), class.as_str(), status, elapsed);

    response
}

fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Record HTTP request completion.
pub fn record_http_request(
    service: &'static str,
    method: &str,
    class: &'static str,
    status_code: u16,
    duration: Duration,
) {
    let status = categorize_status_code(status_code);

    histogram!("http_request_duration_seconds",
        "service" => service,
        "method" => method.to_string(),
        "class" => class,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("http_requests_total",
        "service" => service,
        "method" => method.to_string(),
        "class" => class,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/rejected/timeout/error
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=399 => "success",
        401 => "rejected",
        408 | 504 => "timeout",
        _ => "error",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{HeaderValue, Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.9:53211".parse().unwrap())
    }

    #[test]
    fn test_forwarded_for_first_entry_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.7 , 10.1.1.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(resolve_client_address(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_used_without_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(resolve_client_address(&headers, peer()), "198.51.100.2");
    }

    #[test]
    fn test_empty_forwarded_for_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));

        assert_eq!(resolve_client_address(&headers, peer()), "10.0.0.9");
    }

    #[test]
    fn test_unknown_without_any_source() {
        assert_eq!(resolve_client_address(&HeaderMap::new(), None), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(302), "success");
        assert_eq!(categorize_status_code(401), "rejected");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(502), "error");
        assert_eq!(categorize_status_code(404), "error");
    }

    fn test_app() -> Router {
        let state = AccessLog::new("test", Arc::new(PathClassifier::default()));
        Router::new()
            .route("/ok", get(|| async { "OK" }))
            .route(
                "/teapot",
                get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }),
            )
            .layer(middleware::from_fn_with_state(state, access_log))
    }

    #[tokio::test]
    async fn test_response_passes_through_unchanged() {
        let request = HttpRequest::builder()
            .uri("/teapot?brew=1")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn test_not_found_is_logged_too() {
        let request = HttpRequest::builder()
            .uri("/missing")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
