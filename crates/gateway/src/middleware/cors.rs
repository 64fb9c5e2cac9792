//! Cross-origin resource sharing.
//!
//! Preflight `OPTIONS` requests are answered here and never reach edge
//! authentication or an upstream.

use crate::config::CorsOrigins;
use axum::http::HeaderName;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// How long browsers may cache a preflight answer.
const PREFLIGHT_MAX_AGE_SECS: u64 = 3_600;

/// Response headers scripts may read cross-origin.
const EXPOSED_HEADERS: [HeaderName; 3] = [
    HeaderName::from_static("x-ratelimit-limit"),
    HeaderName::from_static("x-ratelimit-remaining"),
    HeaderName::from_static("x-ratelimit-after"),
];

/// Any method and header from the configured origins. Credentials are not
/// allowed; clients send the bearer credential explicitly.
#[must_use]
pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::any(),
        CorsOrigins::List(list) => AllowOrigin::list(list.iter().cloned()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(EXPOSED_HEADERS)
        .max_age(Duration::from_secs(PREFLIGHT_MAX_AGE_SECS))
}
