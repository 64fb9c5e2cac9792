//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Use them for the
//! credential signing secret, the gateway shared secret and bearer tokens.
//! `SecretString` implements `Debug` with redaction, so any struct deriving
//! `Debug` that holds one gets safe logging behaviour for free.
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! let shared = SecretString::from("gateway-shared-secret");
//! assert!(format!("{shared:?}").contains("REDACTED"));
//! assert_eq!(shared.expose_secret(), "gateway-shared-secret");
//! ```
//!
//! [`SecretMatcher`] compares a presented value against a configured secret
//! without leaking, through timing, how much of the value matched.

use ring::{hmac, rand::SystemRandom};
use std::fmt;
use thiserror::Error;

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};

/// The system random source could not produce a matcher key.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Failed to initialize secret matcher")]
pub struct SecretMatcherError;

/// Constant-time matcher for a configured secret.
///
/// Holds an HMAC tag of the expected value under a per-process random key.
/// A candidate matches when its own tag verifies against the stored one, so
/// the comparison time depends on neither the matching prefix length nor the
/// candidate length.
#[derive(Clone)]
pub struct SecretMatcher {
    key: hmac::Key,
    expected_tag: hmac::Tag,
}

impl SecretMatcher {
    /// Build a matcher for `expected`.
    ///
    /// # Errors
    ///
    /// Returns `SecretMatcherError` if the system RNG fails to generate a key.
    pub fn new(expected: &SecretString) -> Result<Self, SecretMatcherError> {
        let rng = SystemRandom::new();
        let key = hmac::Key::generate(hmac::HMAC_SHA256, &rng).map_err(|_| {
            tracing::error!(target: "common.secret", "System RNG failed to generate matcher key");
            SecretMatcherError
        })?;
        let expected_tag = hmac::sign(&key, expected.expose_secret().as_bytes());
        Ok(Self { key, expected_tag })
    }

    /// Whether `candidate` equals the configured secret.
    #[must_use]
    pub fn matches(&self, candidate: &[u8]) -> bool {
        hmac::verify(&self.key, candidate, self.expected_tag.as_ref()).is_ok()
    }
}

impl fmt::Debug for SecretMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretMatcher")
            .field("expected", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_deserialize() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct GatewaySettings {
            name: String,
            shared_secret: SecretString,
        }

        let json = r#"{"name": "edge", "shared_secret": "my-secret-value"}"#;
        let settings: GatewaySettings = serde_json::from_str(json).expect("deserialize");

        assert_eq!(settings.shared_secret.expose_secret(), "my-secret-value");

        let debug = format!("{settings:?}");
        assert!(!debug.contains("my-secret-value"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_matcher_accepts_exact_value() {
        let matcher = SecretMatcher::new(&SecretString::from("shared-secret")).unwrap();
        assert!(matcher.matches(b"shared-secret"));
    }

    #[test]
    fn test_matcher_rejects_prefix_suffix_and_empty() {
        let matcher = SecretMatcher::new(&SecretString::from("shared-secret")).unwrap();

        assert!(!matcher.matches(b"shared-secre"));
        assert!(!matcher.matches(b"shared-secret "));
        assert!(!matcher.matches(b"SHARED-SECRET"));
        assert!(!matcher.matches(b""));
    }

    #[test]
    fn test_matchers_use_independent_keys() {
        let secret = SecretString::from("shared-secret");
        let first = SecretMatcher::new(&secret).unwrap();
        let second = SecretMatcher::new(&secret).unwrap();

        // Both agree on the outcome even though their tags differ
        assert!(first.matches(b"shared-secret"));
        assert!(second.matches(b"shared-secret"));
        assert_ne!(first.expected_tag.as_ref(), second.expected_tag.as_ref());
    }

    #[test]
    fn test_matcher_debug_is_redacted() {
        let matcher = SecretMatcher::new(&SecretString::from("shared-secret")).unwrap();
        let debug = format!("{matcher:?}");
        assert!(!debug.contains("shared-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
