//! # Gateway Test Utilities
//!
//! Shared test utilities for the edge gateway and the services behind it.
//!
//! This crate provides:
//! - Server test harnesses (`TestGateway`, `TestQaService`)
//! - Credential builders (`TestCredentialBuilder`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let upstream = wiremock::MockServer::start().await;
//!     let gateway = TestGateway::spawn(&upstream.uri()).await?;
//!     let token = TestCredentialBuilder::new().for_user("42", "alice").build();
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/api/user/42/profile", gateway.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use server_harness::*;
pub use token_builders::*;
