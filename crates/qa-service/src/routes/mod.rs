//! HTTP routes for the QA service.

use crate::config::{Config, ConfigError};
use crate::handlers;
use axum::{middleware, routing::get, Router};
use common::access_log::{access_log, AccessLog};
use common::interceptor::{intercept, Interceptor};
use common::paths::PathClassifier;
use common::secret::SecretMatcher;
use common::trust::TrustInterceptor;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/actuator/health` - Liveness probe (internal)
/// - `/api/qa/whoami` - Echo of the gateway-asserted identity
/// - `/api/test/ping` - Public connectivity check
///
/// Every non-internal route requires the gateway secret.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if the gateway secret cannot be
/// loaded into the matcher.
pub fn build_routes(config: &Config) -> Result<Router, ConfigError> {
    let matcher = SecretMatcher::new(&config.gateway_secret)
        .map_err(|e| ConfigError::InvalidValue(format!("GATEWAY_SECRET: {e}")))?;
    let classifier = Arc::new(PathClassifier::default());
    let trust: Arc<dyn Interceptor> =
        Arc::new(TrustInterceptor::new(matcher, classifier.clone()));

    Ok(Router::new()
        .route("/actuator/health", get(handlers::health_check))
        .route("/api/qa/whoami", get(handlers::whoami))
        .route("/api/test/ping", get(handlers::ping))
        .layer(middleware::from_fn_with_state(trust, intercept))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(
            AccessLog::new("qa-service", classifier),
            access_log,
        )))
}
