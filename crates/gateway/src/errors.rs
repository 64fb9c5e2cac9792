//! Gateway error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl,
//! using the same `{"code": .., "message": ..}` body as authentication
//! rejections. Messages returned to clients are intentionally generic; the
//! actual cause is logged server-side.

use crate::session::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::{AuthError, RejectionBody};
use thiserror::Error;

/// Gateway error type.
///
/// Maps to HTTP status codes:
/// - Auth: 401 Unauthorized (uniform body, see `AuthError`)
/// - NoRoute: 404 Not Found
/// - PayloadTooLarge: 413 Payload Too Large
/// - UpstreamUnavailable: 502 Bad Gateway
/// - UpstreamTimeout: 504 Gateway Timeout
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("No upstream route for path")]
    NoRoute,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream timed out")]
    UpstreamTimeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Auth(_) => StatusCode::UNAUTHORIZED,
            GatewayError::NoRoute => StatusCode::NOT_FOUND,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SessionError> for GatewayError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Unauthorized(auth) => GatewayError::Auth(auth),
            SessionError::Signing => {
                GatewayError::Internal("failed to sign credential".to_string())
            }
            SessionError::ExpiryOutOfRange => {
                GatewayError::Internal("credential expiry out of range".to_string())
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            GatewayError::Auth(auth) => return auth.into_response(),
            GatewayError::NoRoute => "No route for request",
            GatewayError::PayloadTooLarge => "Request body too large",
            GatewayError::UpstreamUnavailable(reason) => {
                tracing::warn!(target: "gateway.proxy", reason = %reason, "Upstream unavailable");
                "Upstream service unavailable"
            }
            GatewayError::UpstreamTimeout => {
                tracing::warn!(target: "gateway.proxy", "Upstream timed out");
                "Upstream service timed out"
            }
            GatewayError::Internal(reason) => {
                tracing::error!(target: "gateway.internal", reason = %reason, "Internal error");
                "An internal error occurred"
            }
        };

        let body = RejectionBody {
            code: status.as_u16(),
            message: message.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use axum::http::header;
    use http_body_util::BodyExt;

    async fn body_json(error: GatewayError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upstream_errors_map_to_gateway_statuses() {
        let (status, json) =
            body_json(GatewayError::UpstreamUnavailable("connection refused".to_string())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["code"], 502);
        // Cause stays server-side
        assert!(!json["message"].as_str().unwrap().contains("refused"));

        let (status, json) = body_json(GatewayError::UpstreamTimeout).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(json["code"], 504);
    }

    #[tokio::test]
    async fn test_no_route_and_too_large() {
        let (status, json) = body_json(GatewayError::NoRoute).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], 404);

        let (status, _) = body_json(GatewayError::PayloadTooLarge).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_auth_delegates_to_uniform_401() {
        let response = GatewayError::from(AuthError::ExpiredCredential).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn test_session_errors_convert() {
        let err = GatewayError::from(SessionError::Unauthorized(AuthError::RevokedCredential));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let (status, json) = body_json(GatewayError::from(SessionError::Signing)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "An internal error occurred");
    }
}
