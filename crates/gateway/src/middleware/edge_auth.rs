//! Edge authentication.
//!
//! Runs on every inbound request before it is routed or proxied:
//!
//! 1. Strip any client-supplied trust headers.
//! 2. Classify the path.
//!    - Internal: forward with no trust header.
//!    - Public (and CORS preflight): attach the gateway secret, no decode.
//!    - Auth required: require `Authorization: Bearer <token>`, decode it,
//!      optionally check the session registry, then attach the gateway
//!      secret and identity headers.
//!
//! Every failure collapses to the uniform 401; the specific reason is only
//! logged and counted.

use crate::config::ConfigError;
use crate::session::CredentialRegistry;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use common::error::AuthError;
use common::interceptor::{HeaderMutation, Interceptor, RequestView, Verdict};
use common::jwt::CredentialCodec;
use common::paths::{PathClass, PathClassifier};
use common::secret::{ExposeSecret, SecretString};
use common::trust::{
    strip_trust_headers, GATEWAY_SECRET_HEADER, USER_ID_HEADER, USER_NAME_HEADER,
};
use std::fmt;
use std::sync::Arc;

/// Extract the bearer token from the `Authorization` header.
///
/// # Errors
///
/// - `MissingCredential` if the header is absent
/// - `MalformedCredential` if it is not `Bearer <non-empty token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers.get(header::AUTHORIZATION).ok_or_else(|| {
        tracing::debug!(target: "gateway.middleware.edge_auth", "Missing Authorization header");
        AuthError::MissingCredential
    })?;

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::debug!(
                target: "gateway.middleware.edge_auth",
                "Invalid Authorization header format"
            );
            AuthError::MalformedCredential
        })?;

    Ok(token)
}

/// Interceptor implementing edge authentication.
pub struct EdgeAuthInterceptor {
    classifier: Arc<PathClassifier>,
    codec: Arc<CredentialCodec>,
    gateway_secret: HeaderValue,
    registry: Option<Arc<CredentialRegistry>>,
}

impl fmt::Debug for EdgeAuthInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeAuthInterceptor")
            .field("classifier", &self.classifier)
            .field("codec", &self.codec)
            .field("gateway_secret", &"[REDACTED]")
            .field("require_session", &self.registry.is_some())
            .finish()
    }
}

impl EdgeAuthInterceptor {
    /// Build the interceptor.
    ///
    /// Passing a registry enables session enforcement: a correctly signed,
    /// unexpired credential is still rejected unless it has a live entry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the gateway secret cannot be
    /// sent as a header value.
    pub fn new(
        classifier: Arc<PathClassifier>,
        codec: Arc<CredentialCodec>,
        gateway_secret: &SecretString,
        registry: Option<Arc<CredentialRegistry>>,
    ) -> Result<Self, ConfigError> {
        let mut gateway_secret = HeaderValue::from_str(gateway_secret.expose_secret())
            .map_err(|_| {
                ConfigError::InvalidValue("GATEWAY_SECRET is not a valid header value".to_string())
            })?;
        gateway_secret.set_sensitive(true);

        Ok(Self {
            classifier,
            codec,
            gateway_secret,
            registry,
        })
    }

    fn with_secret(&self, mutation: HeaderMutation) -> HeaderMutation {
        mutation.set(
            HeaderName::from_static(GATEWAY_SECRET_HEADER),
            self.gateway_secret.clone(),
        )
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<HeaderMutation, AuthError> {
        let token = extract_bearer_token(headers)?;

        let claims = self.codec.decode(token).map_err(AuthError::from)?;

        if let Some(registry) = &self.registry {
            if !registry.is_valid(token) {
                return Err(AuthError::RevokedCredential);
            }
        }

        let user_id = HeaderValue::from_str(&claims.sub).map_err(|_| {
            tracing::debug!(
                target: "gateway.middleware.edge_auth",
                "Subject is not representable as a header value"
            );
            AuthError::MalformedCredential
        })?;
        // Usernames may be non-ASCII; forwarded as raw UTF-8 bytes
        let user_name = HeaderValue::from_bytes(claims.username.as_bytes()).map_err(|_| {
            tracing::debug!(
                target: "gateway.middleware.edge_auth",
                "Username is not representable as a header value"
            );
            AuthError::MalformedCredential
        })?;

        Ok(self
            .with_secret(strip_trust_headers())
            .set(HeaderName::from_static(USER_ID_HEADER), user_id)
            .set(HeaderName::from_static(USER_NAME_HEADER), user_name))
    }
}

impl Interceptor for EdgeAuthInterceptor {
    fn name(&self) -> &'static str {
        "edge"
    }

    fn inspect(&self, request: &RequestView<'_>) -> Verdict {
        // CORS preflight never carries credentials
        if *request.method == Method::OPTIONS {
            return Verdict::Forward(self.with_secret(strip_trust_headers()));
        }

        match self.classifier.classify(request.path) {
            PathClass::Internal => Verdict::Forward(strip_trust_headers()),
            PathClass::Public => Verdict::Forward(self.with_secret(strip_trust_headers())),
            PathClass::AuthRequired => match self.authenticate(request.headers) {
                Ok(mutation) => Verdict::Forward(mutation),
                Err(error) => Verdict::Reject(error),
            },
        }
    }
}
