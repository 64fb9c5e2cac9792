//! Reverse proxy to upstream services.
//!
//! Requests are matched against the configured route table by longest path
//! prefix (on a segment boundary) and forwarded with their full original
//! path and query. Bodies are buffered up to [`MAX_PROXY_BODY_BYTES`].
//!
//! Hop-by-hop headers are dropped in both directions, redirects are passed
//! back to the client rather than followed, and `X-Forwarded-For` is
//! extended with the transport peer.

use crate::config::UpstreamRoute;
use crate::errors::GatewayError;
use crate::observability::metrics::record_upstream_request;
use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Largest request body forwarded upstream.
pub const MAX_PROXY_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Connection establishment timeout for upstream requests.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Headers meaningful only for a single transport hop (RFC 9110 §7.6.1).
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Upstream route table ordered for longest-prefix matching.
#[derive(Debug, Clone)]
pub struct UpstreamRoutes {
    routes: Vec<UpstreamRoute>,
}

impl UpstreamRoutes {
    #[must_use]
    pub fn new(mut routes: Vec<UpstreamRoute>) -> Self {
        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { routes }
    }

    /// Route serving `path`, if any.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&UpstreamRoute> {
        self.routes
            .iter()
            .find(|route| prefix_matches(&route.prefix, path))
    }
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Remove hop-by-hop headers, including any named by `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

/// Append the transport peer to `X-Forwarded-For`.
fn append_forwarded_for(headers: &mut HeaderMap, peer: Option<SocketAddr>) {
    let Some(peer) = peer else {
        return;
    };
    let ip = peer.ip().to_string();

    let value = match headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        Some(existing) if !existing.trim().is_empty() => format!("{existing}, {ip}"),
        _ => ip,
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert("x-forwarded-for", value);
    }
}

/// HTTP client forwarding requests to upstream services.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    routes: Arc<UpstreamRoutes>,
}

impl ProxyClient {
    /// Create a proxy client.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Internal` if the HTTP client cannot be built.
    pub fn new(routes: Vec<UpstreamRoute>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                tracing::error!(target: "gateway.services.proxy", error = %e, "Failed to build HTTP client");
                GatewayError::Internal("failed to build HTTP client".to_string())
            })?;

        Ok(Self {
            client,
            routes: Arc::new(UpstreamRoutes::new(routes)),
        })
    }

    #[must_use]
    pub fn routes(&self) -> &UpstreamRoutes {
        &self.routes
    }

    /// Forward `request` to the upstream owning its path.
    ///
    /// # Errors
    ///
    /// - `NoRoute` if no configured prefix matches
    /// - `PayloadTooLarge` if the body exceeds [`MAX_PROXY_BODY_BYTES`]
    /// - `UpstreamTimeout` if the upstream does not answer in time
    /// - `UpstreamUnavailable` for connection and protocol failures
    #[instrument(skip_all, name = "gateway.services.proxy.forward")]
    pub async fn forward(&self, request: Request) -> Result<Response, GatewayError> {
        let (parts, body) = request.into_parts();

        let route = self.routes.resolve(parts.uri.path()).ok_or_else(|| {
            tracing::debug!(
                target: "gateway.services.proxy",
                path = %parts.uri.path(),
                "No upstream route"
            );
            GatewayError::NoRoute
        })?;

        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
        let url = format!("{}{}", route.target, path_and_query);

        let body = axum::body::to_bytes(body, MAX_PROXY_BODY_BYTES)
            .await
            .map_err(|e| {
                tracing::debug!(target: "gateway.services.proxy", error = %e, "Failed to read request body");
                GatewayError::PayloadTooLarge
            })?;

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);
        append_forwarded_for(&mut headers, peer);

        let start = Instant::now();
        let upstream = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| upstream_error(&route.prefix, start, &e))?;

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        let response_body = upstream
            .bytes()
            .await
            .map_err(|e| upstream_error(&route.prefix, start, &e))?;

        record_upstream_request(&route.prefix, "success", start.elapsed());
        tracing::debug!(
            target: "gateway.services.proxy",
            route = %route.prefix,
            status = status.as_u16(),
            "Upstream responded"
        );

        strip_hop_by_hop(&mut response_headers);
        response_headers.remove(header::CONTENT_LENGTH);

        let mut response = Response::new(Body::from(response_body));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

fn upstream_error(route: &str, start: Instant, err: &reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        record_upstream_request(route, "timeout", start.elapsed());
        GatewayError::UpstreamTimeout
    } else {
        record_upstream_request(route, "error", start.elapsed());
        GatewayError::UpstreamUnavailable(err.to_string())
    }
}
