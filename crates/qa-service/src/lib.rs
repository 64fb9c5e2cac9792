//! QA Service Library
//!
//! A downstream service behind the edge gateway. It performs no credential
//! validation of its own: every non-internal request must carry the shared
//! gateway secret, and the caller's identity is read from the trust headers
//! the gateway attaches.
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `handlers` - HTTP request handlers
//! - `routes` - Axum router setup

pub mod config;
pub mod handlers;
pub mod routes;
