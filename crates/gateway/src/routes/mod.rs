//! HTTP routes for the gateway.
//!
//! Defines the Axum router and application state.

use crate::config::{Config, ConfigError};
use crate::errors::GatewayError;
use crate::handlers;
use crate::middleware::{cors_layer, with_rate_limit, EdgeAuthInterceptor};
use crate::services::ProxyClient;
use crate::session::{CredentialRegistry, SessionService};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use common::access_log::{access_log, AccessLog};
use common::clock::Clock;
use common::interceptor::{intercept, Interceptor};
use common::jwt::CredentialCodec;
use common::paths::PathClassifier;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Headroom between the upstream timeout and the whole-request timeout, so
/// an upstream timeout surfaces as 504 rather than a generic request timeout.
const REQUEST_TIMEOUT_HEADROOM_SECS: u64 = 5;

/// Application state shared across all handlers.
#[derive(Debug)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Path classification table shared by edge auth and access logging.
    pub classifier: Arc<PathClassifier>,

    /// Credential signer/verifier.
    pub codec: Arc<CredentialCodec>,

    /// Session issuance, renewal and revocation.
    pub sessions: SessionService,

    /// Upstream forwarding.
    pub proxy: ProxyClient,
}

impl AppState {
    /// Wire up the gateway components from configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Internal` if a configured duration is out of
    /// range or the upstream HTTP client cannot be built.
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Result<Self, GatewayError> {
        let codec = Arc::new(CredentialCodec::new(&config.jwt_secret, clock.clone()));
        let registry = Arc::new(CredentialRegistry::new(clock.clone()));
        let ttl = chrono::Duration::try_seconds(config.jwt_ttl_seconds)
            .ok_or_else(|| GatewayError::Internal("credential lifetime out of range".to_string()))?;
        let renewal_threshold =
            chrono::Duration::try_seconds(config.session_renewal_threshold_seconds).ok_or_else(
                || GatewayError::Internal("renewal threshold out of range".to_string()),
            )?;
        let sessions = SessionService::new(codec.clone(), registry, clock, ttl, renewal_threshold);
        let proxy = ProxyClient::new(
            config.upstream_routes.clone(),
            Duration::from_secs(config.upstream_timeout_seconds),
        )?;

        Ok(Self {
            config,
            classifier: Arc::new(PathClassifier::default()),
            codec,
            sessions,
            proxy,
        })
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/actuator/health` - Liveness probe (internal)
/// - `/metrics` - Prometheus scrape endpoint (internal)
/// - `/api/session/renew`, `/api/session/logout` - Session management
/// - `/api/user/login`, `/api/user/register` - Proxied; a returned
///   credential is registered
/// - fallback - Reverse proxy to the configured upstreams
///
/// # Errors
///
/// Returns `ConfigError` if the edge interceptor cannot be built from the
/// configured gateway secret or the rate limit quota is invalid.
pub fn build_routes(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
) -> Result<Router, ConfigError> {
    let registry = state
        .config
        .require_session
        .then(|| state.sessions.registry().clone());
    let edge: Arc<dyn Interceptor> = Arc::new(EdgeAuthInterceptor::new(
        state.classifier.clone(),
        state.codec.clone(),
        &state.config.gateway_secret,
        registry,
    )?);
    let access = AccessLog::new("gateway", state.classifier.clone());
    let request_timeout = Duration::from_secs(
        state.config.upstream_timeout_seconds + REQUEST_TIMEOUT_HEADROOM_SECS,
    );

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let app_routes = Router::new()
        .route("/actuator/health", get(handlers::health_check))
        .route("/api/session/renew", post(handlers::renew_session))
        .route("/api/session/logout", post(handlers::logout))
        .route(
            "/api/user/login",
            post(handlers::auth_passthrough).fallback(handlers::proxy_handler),
        )
        .route(
            "/api/user/register",
            post(handlers::auth_passthrough).fallback(handlers::proxy_handler),
        )
        .fallback(handlers::proxy_handler)
        .with_state(state.clone());

    // Layer order (outermost first on the way in):
    // 1. access_log - logs and counts every response, including rejections
    // 2. CorsLayer - answers preflights, decorates every response
    // 3. rate limit (optional)
    // 4. TimeoutLayer
    // 5. TraceLayer
    // 6. edge intercept - authenticates and rewrites headers (innermost)
    let router = app_routes
        .merge(metrics_routes)
        .layer(middleware::from_fn_with_state(edge, intercept))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout));

    let router = match state.config.rate_limit {
        Some(limit) => with_rate_limit(router, limit)?,
        None => router,
    };

    Ok(router
        .layer(cors_layer(&state.config.cors_origins))
        .layer(middleware::from_fn_with_state(access, access_log)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use common::clock::SystemClock;
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        test_state_with(&[])
    }

    fn test_state_with(extra: &[(&str, &str)]) -> Arc<AppState> {
        let mut vars = HashMap::from([
            (
                "JWT_SECRET".to_string(),
                "test-signing-secret-with-32-bytes!!".to_string(),
            ),
            ("GATEWAY_SECRET".to_string(), "shared".to_string()),
            // Nothing listens on port 9; proxying is not exercised here
            ("UPSTREAM_ROUTES".to_string(), "/api=http://127.0.0.1:9".to_string()),
        ]);
        for (key, value) in extra {
            vars.insert((*key).to_string(), (*value).to_string());
        }
        let config = Config::from_vars(&vars).unwrap();
        Arc::new(AppState::new(config, Arc::new(SystemClock)).unwrap())
    }

    fn app() -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        build_routes(test_state(), handle).unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_credential() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/actuator/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "UP");
    }

    #[tokio::test]
    async fn test_metrics_needs_no_credential() {
        let response = app()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_session_routes_require_credential() {
        for path in ["/api/session/renew", "/api/session/logout"] {
            let response = app()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri(path)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
        }
    }

    #[tokio::test]
    async fn test_unrouted_public_path_is_404() {
        // Public, so it passes edge auth, but no upstream owns "/"
        let response = app()
            .oneshot(Request::builder().uri("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], 404);
    }

    #[tokio::test]
    async fn test_issue_then_renew_and_logout() {
        let state = test_state();
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let app = build_routes(state.clone(), handle).unwrap();
        let issued = state.sessions.issue("42", "alice", Vec::new()).unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/session/renew")
                    .header("authorization", format!("Bearer {}", issued.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["renewed"], false);
        assert_eq!(json["token"], issued.token.as_str());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/session/logout")
                    .header("authorization", format!("Bearer {}", issued.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(!state.sessions.registry().is_valid(&issued.token));
    }

    #[tokio::test]
    async fn test_preflight_answered_without_credential() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/user/42")
                    .header("origin", "https://app.example.com")
                    .header("access-control-request-method", "DELETE")
                    .header("access-control-request-headers", "authorization")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "*");
        assert_eq!(headers["access-control-max-age"], "3600");
    }

    #[tokio::test]
    async fn test_cors_origin_list_only_echoes_allowed_origin() {
        let state = test_state_with(&[("CORS_ALLOWED_ORIGINS", "https://app.example.com")]);
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let app = build_routes(state, handle).unwrap();

        let allowed = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/actuator/health")
                    .header("origin", "https://app.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()["access-control-allow-origin"],
            "https://app.example.com"
        );

        let other = app
            .oneshot(
                Request::builder()
                    .uri("/actuator/health")
                    .header("origin", "https://evil.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(other.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_burst_exhaustion_returns_429() {
        let state = test_state_with(&[
            ("GATEWAY_RATE_LIMIT_PER_SECOND", "1"),
            ("GATEWAY_RATE_LIMIT_BURST", "2"),
        ]);
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let app = build_routes(state, handle).unwrap();

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/actuator/health")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            statuses.push(response.status());
        }

        assert_eq!(
            statuses,
            vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_disabled_never_throttles() {
        let state = test_state_with(&[
            ("GATEWAY_RATE_LIMIT_ENABLED", "false"),
            ("GATEWAY_RATE_LIMIT_BURST", "1"),
        ]);
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let app = build_routes(state, handle).unwrap();

        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/actuator/health")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
