//! Trust headers and the downstream trust filter.
//!
//! The gateway attaches [`GATEWAY_SECRET_HEADER`] (and, for authenticated
//! requests, the identity headers) to every request it forwards. Downstream
//! services run [`TrustInterceptor`] in front of their handlers and refuse
//! anything that did not come through the gateway, regardless of what
//! identity headers it carries.

use crate::error::AuthError;
use crate::interceptor::{HeaderMutation, Interceptor, RequestView, Verdict};
use crate::paths::{PathClass, PathClassifier};
use crate::secret::SecretMatcher;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderName},
};
use std::convert::Infallible;
use std::sync::Arc;

/// Shared secret proving a request passed through the gateway.
pub const GATEWAY_SECRET_HEADER: &str = "x-gateway-secret";

/// Authenticated subject (`claims.sub`).
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated username (`claims.username`).
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Mutation that strips every trust header.
///
/// The edge applies this to all inbound requests so a client can never
/// smuggle its own copies through.
#[must_use]
pub fn strip_trust_headers() -> HeaderMutation {
    HeaderMutation::none()
        .remove(HeaderName::from_static(GATEWAY_SECRET_HEADER))
        .remove(HeaderName::from_static(USER_ID_HEADER))
        .remove(HeaderName::from_static(USER_NAME_HEADER))
}

/// Downstream filter requiring the gateway secret on every non-internal path.
#[derive(Debug, Clone)]
pub struct TrustInterceptor {
    matcher: SecretMatcher,
    classifier: Arc<PathClassifier>,
}

impl TrustInterceptor {
    #[must_use]
    pub fn new(matcher: SecretMatcher, classifier: Arc<PathClassifier>) -> Self {
        Self {
            matcher,
            classifier,
        }
    }
}

impl Interceptor for TrustInterceptor {
    fn name(&self) -> &'static str {
        "trust"
    }

    fn inspect(&self, request: &RequestView<'_>) -> Verdict {
        if self.classifier.classify(request.path) == PathClass::Internal {
            return Verdict::Forward(HeaderMutation::none());
        }

        match request.headers.get(GATEWAY_SECRET_HEADER) {
            None => Verdict::Reject(AuthError::MissingTrustHeader),
            Some(value) if self.matcher.matches(value.as_bytes()) => {
                Verdict::Forward(HeaderMutation::none())
            }
            Some(_) => Verdict::Reject(AuthError::TrustHeaderMismatch),
        }
    }
}

/// Identity asserted by the gateway for the current request.
///
/// Only meaningful behind [`TrustInterceptor`]. Both fields are `None` for
/// public paths, where the gateway attaches the secret but no identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayIdentity {
    /// Subject of the verified credential (`X-User-Id`).
    pub user_id: Option<String>,
    /// Username of the verified credential (`X-User-Name`).
    pub user_name: Option<String>,
}

impl GatewayIdentity {
    /// Whether the gateway authenticated a user for this request.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for GatewayIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let read = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
                .map(str::to_owned)
        };

        Ok(Self {
            user_id: read(USER_ID_HEADER),
            user_name: read(USER_NAME_HEADER),
        })
    }
}
