//! Edge Gateway Library
//!
//! The gateway is the single ingress for the QA platform. Every request is:
//!
//! - classified by path (public, authentication-required, internal)
//! - authenticated at the edge when required (signed bearer credential,
//!   optionally checked against the session registry)
//! - stripped of client-supplied trust headers and stamped with the shared
//!   gateway secret and verified identity
//! - forwarded to the upstream owning its path prefix
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/edge_auth.rs -> handlers/*.rs -> services/*.rs
//!                                                           -> session/*.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Edge authentication interceptor
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Reverse proxy to upstream services
//! - `session` - Credential registry and session lifecycle
//! - `tasks` - Background maintenance tasks

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod services;
pub mod session;
pub mod tasks;
