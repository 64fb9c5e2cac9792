//! Authentication failure taxonomy.
//!
//! Every variant maps to the same externally visible response: HTTP 401 with
//! an identical JSON body. The variant itself only reaches server-side logs and
//! the bounded `reason` metric label, so a caller can never tell an expired
//! credential from a forged one.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Generic message returned for every authentication failure.
pub const UNAUTHORIZED_MESSAGE: &str = "Authentication required";

/// Value of the `WWW-Authenticate` header attached to 401 responses.
const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"qa-platform\"";

/// Reasons a request can fail authentication at the edge or downstream.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header on a path that requires one.
    #[error("Missing credential")]
    MissingCredential,

    /// `Authorization` header present but not a usable bearer credential.
    #[error("Malformed credential")]
    MalformedCredential,

    /// Credential signature does not verify under the configured secret.
    #[error("Invalid credential signature")]
    InvalidSignature,

    /// Credential is correctly signed but past its expiry.
    #[error("Expired credential")]
    ExpiredCredential,

    /// Credential decoded but has no live registry entry.
    #[error("Revoked credential")]
    RevokedCredential,

    /// Downstream request carries no gateway secret header.
    #[error("Missing trust header")]
    MissingTrustHeader,

    /// Downstream request carries a gateway secret that does not match.
    #[error("Trust header mismatch")]
    TrustHeaderMismatch,
}

impl AuthError {
    /// Bounded label for logs and metrics.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::ExpiredCredential => "expired_credential",
            AuthError::RevokedCredential => "revoked_credential",
            AuthError::MissingTrustHeader => "missing_trust_header",
            AuthError::TrustHeaderMismatch => "trust_header_mismatch",
        }
    }
}

/// JSON body of a rejected request.
#[derive(Debug, Serialize)]
pub struct RejectionBody {
    /// HTTP status code, repeated in the body for clients that only read JSON.
    pub code: u16,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(target: "common.auth", reason = self.reason(), "Request rejected");

        let body = RejectionBody {
            code: StatusCode::UNAUTHORIZED.as_u16(),
            message: UNAUTHORIZED_MESSAGE.to_string(),
        };
        let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
        );
        response
    }
}
