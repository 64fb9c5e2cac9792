//! Middleware for the gateway.
//!
//! # Components
//!
//! - `cors` - CORS headers and preflight answers
//! - `edge_auth` - Edge authentication interceptor (runs through
//!   `common::interceptor::intercept`)
//! - `rate_limit` - Per-client token bucket
//!
//! Access logging and request metrics come from `common::access_log`.

pub mod cors;
pub mod edge_auth;
pub mod rate_limit;

pub use cors::cors_layer;
pub use edge_auth::{extract_bearer_token, EdgeAuthInterceptor};
pub use rate_limit::{with_rate_limit, ClientIpKeyExtractor};
