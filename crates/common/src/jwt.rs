//! Credential claims and the signed-token codec.
//!
//! Credentials are compact HS256 JWTs signed with a process-wide secret. The
//! codec is built once at startup from that secret and is never reconfigured;
//! changing the secret means building a new codec.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only HS256 is accepted; tokens carrying any other `alg` are malformed
//! - Signature is verified before any claim is trusted, so a forged token is
//!   always reported as a signature failure, never as expired
//! - The `sub` field in Claims is redacted in Debug output

use crate::clock::Clock;
use crate::error::AuthError;
use crate::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted credential size in bytes (8KB).
///
/// Typical credentials are 200-400 bytes. Anything larger is rejected before
/// base64 decoding or HMAC computation.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Minimum signing secret length in bytes (256 bits for HS256).
pub const MIN_SIGNING_SECRET_BYTES: usize = 32;

// =============================================================================
// Error Types
// =============================================================================

/// Errors from encoding or decoding a credential.
///
/// Display messages are intentionally identical for the decode failures.
/// Callers log the variant and respond with a generic 401.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Token cannot be parsed into the expected structure.
    #[error("The access token is invalid or expired")]
    Malformed,

    /// Signature does not verify under the configured secret.
    #[error("The access token is invalid or expired")]
    InvalidSignature,

    /// Signature is valid but `exp` is not in the future.
    #[error("The access token is invalid or expired")]
    Expired,

    /// Claims could not be serialized and signed.
    #[error("Failed to sign credential")]
    Signing,
}

impl From<CodecError> for AuthError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidSignature => AuthError::InvalidSignature,
            CodecError::Expired => AuthError::ExpiredCredential,
            CodecError::Malformed | CodecError::Signing => AuthError::MalformedCredential,
        }
    }
}

// =============================================================================
// Claims Types
// =============================================================================

/// Claims carried by a user credential.
///
/// # Fields
///
/// - `sub`: Subject (user identifier)
/// - `username`: Display username
/// - `roles`: Ordered role names, possibly empty
/// - `iat`: Issued-at timestamp (Unix epoch seconds)
/// - `exp`: Expiration timestamp (Unix epoch seconds), always after `iat`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier) - redacted in Debug output.
    pub sub: String,

    /// Username of the subject.
    pub username: String,

    /// Roles granted to the subject, in issuance order.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("username", &self.username)
            .field("roles", &self.roles)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

impl Claims {
    /// Creates a new `Claims` instance.
    #[must_use]
    pub fn new(
        sub: impl Into<String>,
        username: impl Into<String>,
        roles: Vec<String>,
        iat: i64,
        exp: i64,
    ) -> Self {
        Self {
            sub: sub.into(),
            username: username.into(),
            roles,
            iat,
            exp,
        }
    }

    /// Check if the subject holds a role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

// =============================================================================
// Codec
// =============================================================================

/// Signs and verifies credentials with a fixed HS256 secret.
pub struct CredentialCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCodec")
            .field("secret", &"[REDACTED]")
            .field("clock", &self.clock)
            .finish()
    }
}

impl CredentialCodec {
    /// Build a codec for `secret`.
    ///
    /// Secret length is validated by service configuration
    /// (see [`MIN_SIGNING_SECRET_BYTES`]), not here.
    #[must_use]
    pub fn new(secret: &SecretString, clock: Arc<dyn Clock>) -> Self {
        let secret_bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock after decoding
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret_bytes),
            decoding_key: DecodingKey::from_secret(secret_bytes),
            validation,
            clock,
        }
    }

    /// Sign `claims` into a compact token.
    ///
    /// Deterministic: identical claims and secret produce an identical token.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Signing` if the claims cannot be serialized.
    pub fn encode(&self, claims: &Claims) -> Result<String, CodecError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            tracing::error!(target: "common.jwt", error = %e, "Failed to sign credential");
            CodecError::Signing
        })
    }

    /// Verify `token` and return its claims.
    ///
    /// # Errors
    ///
    /// - `Malformed` - oversized, not a JWT, wrong algorithm, missing claims,
    ///   or `exp <= iat`
    /// - `InvalidSignature` - signed with a different secret or tampered
    /// - `Expired` - `exp <= now`
    pub fn decode(&self, token: &str) -> Result<Claims, CodecError> {
        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::debug!(
                target: "common.jwt",
                token_size = token.len(),
                max_size = MAX_JWT_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(CodecError::Malformed);
        }

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => {
                        tracing::debug!(target: "common.jwt", "Token rejected: signature mismatch");
                        CodecError::InvalidSignature
                    }
                    kind => {
                        tracing::debug!(target: "common.jwt", error = ?kind, "Token rejected: malformed");
                        CodecError::Malformed
                    }
                }
            })?;
        let claims = token_data.claims;

        if claims.exp <= claims.iat {
            tracing::debug!(
                target: "common.jwt",
                iat = claims.iat,
                exp = claims.exp,
                "Token rejected: exp does not follow iat"
            );
            return Err(CodecError::Malformed);
        }

        let now = self.clock.now().timestamp();
        if claims.exp <= now {
            tracing::debug!(
                target: "common.jwt",
                exp = claims.exp,
                now = now,
                "Token rejected: expired"
            );
            return Err(CodecError::Expired);
        }

        Ok(claims)
    }
}

// =============================================================================
// Tests
// =============================================================================
