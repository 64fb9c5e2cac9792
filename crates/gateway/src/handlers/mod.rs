//! HTTP request handlers for the gateway.

pub mod auth;
pub mod health;
pub mod metrics;
pub mod proxy;
pub mod session;

pub use auth::auth_passthrough;
pub use health::health_check;
pub use metrics::metrics_handler;
pub use proxy::proxy_handler;
pub use session::{logout, renew_session};
