//! Observability for the gateway.
//!
//! Structured logging is configured in `main.rs`; this module holds the
//! Prometheus recorder setup and gateway-specific metric helpers.

pub mod metrics;
