//! Builder patterns for test credentials
//!
//! Provides a fluent API for creating signed bearer credentials.

use crate::server_harness::TEST_JWT_SECRET;
use chrono::{Duration, Utc};
use common::clock::SystemClock;
use common::jwt::{Claims, CredentialCodec};
use common::secret::SecretString;
use std::sync::Arc;

/// Builder for signed test credentials
///
/// Signs with [`TEST_JWT_SECRET`] unless told otherwise, so built tokens are
/// accepted by a [`TestGateway`](crate::TestGateway).
///
/// # Example
/// ```rust,ignore
/// let token = TestCredentialBuilder::new()
///     .for_user("42", "alice")
///     .with_role("admin")
///     .expires_in(3600)
///     .build();
/// ```
pub struct TestCredentialBuilder {
    sub: String,
    username: String,
    roles: Vec<String>,
    iat: i64,
    exp: i64,
    secret: String,
}

impl TestCredentialBuilder {
    /// Create a new credential builder with defaults (valid for one hour)
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-user".to_string(),
            username: "tester".to_string(),
            roles: Vec::new(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            secret: TEST_JWT_SECRET.to_string(),
        }
    }

    /// Set the subject identifier and display name
    pub fn for_user(mut self, sub: &str, username: &str) -> Self {
        self.sub = sub.to_string();
        self.username = username.to_string();
        self
    }

    /// Add a role
    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.push(role.to_string());
        self
    }

    /// Set expiration in seconds from now
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Issued two hours ago, expired one hour ago
    pub fn expired(mut self) -> Self {
        let now = Utc::now();
        self.iat = (now - Duration::seconds(7200)).timestamp();
        self.exp = (now - Duration::seconds(3600)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Sign with a different secret
    pub fn signed_with(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    /// Build the claims without signing
    pub fn claims(&self) -> Claims {
        Claims::new(
            self.sub.clone(),
            self.username.clone(),
            self.roles.clone(),
            self.iat,
            self.exp,
        )
    }

    /// Build the signed credential
    pub fn build(self) -> String {
        let codec = CredentialCodec::new(
            &SecretString::from(self.secret.clone()),
            Arc::new(SystemClock),
        );
        codec
            .encode(&self.claims())
            .expect("test claims should always sign")
    }
}

impl Default for TestCredentialBuilder {
    fn default() -> Self {
        Self::new()
    }
}
