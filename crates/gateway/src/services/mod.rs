//! Service layer for the gateway.
//!
//! # Components
//!
//! - `proxy` - Reverse proxy forwarding authenticated requests upstream

pub mod proxy;

pub use proxy::{ProxyClient, UpstreamRoutes};
