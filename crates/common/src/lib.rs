//! Common authentication primitives shared by the edge gateway and the
//! downstream services it fronts.

#![warn(clippy::pedantic)]

/// Module for the authentication failure taxonomy and its 401 response
pub mod error;

/// Module for time sources (system clock, manual clock for tests)
pub mod clock;

/// Module for secret types and constant-time secret matching
pub mod secret;

/// Module for credential claims and the signed-token codec
pub mod jwt;

/// Module for ordered path classification rules
pub mod paths;

/// Module for the request interceptor contract and its axum adapter
pub mod interceptor;

/// Module for trust headers and the downstream trust-propagation interceptor
pub mod trust;

/// Module for the request access-log middleware
pub mod access_log;
