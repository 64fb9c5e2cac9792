//! Session issuance, renewal and revocation.
//!
//! A session is a signed credential plus its registry entry. Issuance signs
//! the claims and registers the token; renewal re-issues a fresh credential
//! once the current one is close to expiry and retires the old entry;
//! revocation drops the entry, which matters when the gateway runs with
//! session enforcement enabled.

pub mod registry;

pub use registry::CredentialRegistry;

use crate::observability::metrics::record_session_event;
use chrono::{DateTime, Duration, Utc};
use common::clock::Clock;
use common::error::AuthError;
use common::jwt::{Claims, CredentialCodec};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// A freshly issued credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedSession {
    /// Signed credential.
    pub token: String,
    /// Expiry of the credential and of its registry entry.
    pub expires_at: DateTime<Utc>,
}

/// Result of a renewal attempt on a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewOutcome {
    /// Enough lifetime remains; keep using the presented credential.
    Unchanged,
    /// A new credential replaces the presented one, which is no longer registered.
    Renewed(IssuedSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session rejected: {0}")]
    Unauthorized(AuthError),

    #[error("Failed to sign credential")]
    Signing,

    #[error("Credential expiry out of range")]
    ExpiryOutOfRange,
}

/// Issues, renews and revokes sessions.
#[derive(Debug, Clone)]
pub struct SessionService {
    codec: Arc<CredentialCodec>,
    registry: Arc<CredentialRegistry>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    renewal_threshold: Duration,
}

impl SessionService {
    #[must_use]
    pub fn new(
        codec: Arc<CredentialCodec>,
        registry: Arc<CredentialRegistry>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        renewal_threshold: Duration,
    ) -> Self {
        Self {
            codec,
            registry,
            clock,
            ttl,
            renewal_threshold,
        }
    }

    /// Sign a new credential for the subject and register it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ExpiryOutOfRange` if `now + ttl` is not
    /// representable, and `SessionError::Signing` if the codec cannot sign
    /// the claims.
    #[instrument(skip_all, name = "gateway.session.issue")]
    pub fn issue(
        &self,
        sub: &str,
        username: &str,
        roles: Vec<String>,
    ) -> Result<IssuedSession, SessionError> {
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            record_session_event("issue", "error");
            SessionError::ExpiryOutOfRange
        })?;
        let claims = Claims::new(sub, username, roles, now.timestamp(), expires_at.timestamp());

        let token = self.codec.encode(&claims).map_err(|e| {
            tracing::error!(target: "gateway.session", error = %e, "Failed to sign credential");
            record_session_event("issue", "error");
            SessionError::Signing
        })?;

        self.registry.store(&token, expires_at);
        record_session_event("issue", "success");
        tracing::debug!(target: "gateway.session", "Session issued");

        Ok(IssuedSession { token, expires_at })
    }

    /// Register a credential signed elsewhere (the login upstream) so that
    /// renewal, logout and session enforcement apply to it.
    ///
    /// The registry entry expires with the credential's own `exp`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unauthorized` if the credential does not
    /// decode, and `SessionError::ExpiryOutOfRange` if its `exp` is not a
    /// representable timestamp.
    #[instrument(skip_all, name = "gateway.session.register")]
    pub fn register(&self, token: &str) -> Result<DateTime<Utc>, SessionError> {
        let claims = self.codec.decode(token).map_err(|e| {
            record_session_event("register", "rejected");
            SessionError::Unauthorized(e.into())
        })?;

        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or_else(|| {
            record_session_event("register", "error");
            SessionError::ExpiryOutOfRange
        })?;

        self.registry.store(token, expires_at);
        record_session_event("register", "success");
        tracing::debug!(target: "gateway.session", "Session registered");

        Ok(expires_at)
    }

    /// Re-issue `token` if it is live and has less than the renewal
    /// threshold left before its `exp`.
    ///
    /// Claims (subject, username, roles) carry over to the new credential.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unauthorized` if the credential does not decode
    /// or has no live registry entry, and `SessionError::Signing` if the
    /// replacement cannot be signed.
    #[instrument(skip_all, name = "gateway.session.renew")]
    pub fn renew_if_needed(&self, token: &str) -> Result<RenewOutcome, SessionError> {
        let claims = self.codec.decode(token).map_err(|e| {
            record_session_event("renew", "rejected");
            SessionError::Unauthorized(e.into())
        })?;

        if !self.registry.is_valid(token) {
            record_session_event("renew", "rejected");
            return Err(SessionError::Unauthorized(AuthError::RevokedCredential));
        }

        let remaining = claims.exp - self.clock.now().timestamp();
        if remaining >= self.renewal_threshold.num_seconds() {
            record_session_event("renew", "unchanged");
            return Ok(RenewOutcome::Unchanged);
        }

        let Claims {
            sub,
            username,
            roles,
            ..
        } = claims;
        let issued = self.issue(&sub, &username, roles)?;

        if issued.token != token {
            self.registry.remove(token);
        }

        record_session_event("renew", "success");
        tracing::debug!(
            target: "gateway.session",
            remaining_seconds = remaining,
            "Session renewed"
        );

        Ok(RenewOutcome::Renewed(issued))
    }

    /// Drop the registry entry for `token`. Idempotent.
    #[instrument(skip_all, name = "gateway.session.revoke")]
    pub fn revoke(&self, token: &str) {
        self.registry.remove(token);
        record_session_event("revoke", "success");
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<CredentialRegistry> {
        &self.registry
    }
}
