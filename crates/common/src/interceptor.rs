//! Request interceptor contract.
//!
//! Both the edge authentication filter and the downstream trust filter are
//! expressed as an [`Interceptor`]: a synchronous decision over the request
//! line and headers that either forwards the request with a header mutation
//! or rejects it with an [`AuthError`]. [`intercept`] is the single axum
//! middleware that runs any interceptor.
//!
//! # Example
//!
//! ```rust,ignore
//! let interceptor: Arc<dyn Interceptor> = Arc::new(TrustInterceptor::new(matcher, classifier));
//! let app = Router::new()
//!     .route("/api/qa/whoami", get(whoami))
//!     .layer(middleware::from_fn_with_state(interceptor, intercept));
//! ```

use crate::error::AuthError;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

/// Borrowed view of the parts of a request an interceptor may inspect.
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    /// HTTP method.
    pub method: &'a Method,
    /// URI path, without the query string.
    pub path: &'a str,
    /// Headers as received, before any mutation.
    pub headers: &'a HeaderMap,
}

impl<'a> RequestView<'a> {
    /// Build a view over an axum request.
    #[must_use]
    pub fn of(request: &'a Request) -> Self {
        Self {
            method: request.method(),
            path: request.uri().path(),
            headers: request.headers(),
        }
    }

    /// First value of `name` as a string, if present and visible ASCII.
    #[must_use]
    pub fn header_str(&self, name: &str) -> Option<&'a str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Header changes to apply to a forwarded request.
///
/// Removals are applied before insertions, so a header can be stripped and
/// then set to a trusted value in one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMutation {
    remove: Vec<HeaderName>,
    set: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderMutation {
    /// An empty mutation (forward unchanged).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Remove every value of `name`.
    #[must_use]
    pub fn remove(mut self, name: HeaderName) -> Self {
        self.remove.push(name);
        self
    }

    /// Replace all values of `name` with `value`.
    #[must_use]
    pub fn set(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.set.push((name, value));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.set.is_empty()
    }

    /// Apply to an owned header map.
    pub fn apply(self, headers: &mut HeaderMap) {
        for name in &self.remove {
            headers.remove(name);
        }
        for (name, value) in self.set {
            headers.insert(name, value);
        }
    }
}

/// Outcome of inspecting a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Continue to the next layer after applying the mutation.
    Forward(HeaderMutation),
    /// Stop and answer with the uniform 401.
    Reject(AuthError),
}

/// A synchronous request filter.
pub trait Interceptor: Send + Sync + 'static {
    /// Short, stable name used as the `layer` log field and metric label.
    fn name(&self) -> &'static str;

    /// Decide what happens to the request.
    fn inspect(&self, request: &RequestView<'_>) -> Verdict;
}

/// Axum middleware running an [`Interceptor`].
///
/// The request is consumed by value; on `Forward` the mutation is applied to
/// it before it is handed to the next layer.
#[instrument(skip_all, name = "common.interceptor")]
pub async fn intercept(
    State(interceptor): State<Arc<dyn Interceptor>>,
    mut request: Request,
    next: Next,
) -> Response {
    let verdict = interceptor.inspect(&RequestView::of(&request));

    match verdict {
        Verdict::Forward(mutation) => {
            mutation.apply(request.headers_mut());
            next.run(request).await
        }
        Verdict::Reject(error) => {
            tracing::warn!(
                target: "common.interceptor",
                layer = interceptor.name(),
                reason = error.reason(),
                method = %request.method(),
                path = %request.uri().path(),
                "Request rejected"
            );
            metrics::counter!(
                "auth_rejections_total",
                "layer" => interceptor.name(),
                "reason" => error.reason()
            )
            .increment(1);
            error.into_response()
        }
    }
}
