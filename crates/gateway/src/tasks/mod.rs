//! Background tasks for the gateway.
//!
//! # Tasks
//!
//! - `registry_sweep` - Purges expired entries from the credential registry

pub mod registry_sweep;

pub use registry_sweep::start_registry_sweep;
