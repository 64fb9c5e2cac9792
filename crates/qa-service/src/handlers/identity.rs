//! Identity handlers.
//!
//! The QA service never sees credentials; it relies on the identity the
//! gateway asserted in trust headers.

use axum::Json;
use common::trust::GatewayIdentity;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Response for `GET /api/qa/whoami`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    /// Whether the gateway asserted a user for this request.
    pub authenticated: bool,
    /// Asserted user id, `null` on public paths.
    pub user_id: Option<String>,
    /// Asserted username, `null` on public paths.
    pub user_name: Option<String>,
}

/// Handler for GET /api/qa/whoami
#[instrument(skip_all, name = "qa.handlers.whoami")]
pub async fn whoami(identity: GatewayIdentity) -> Json<WhoAmIResponse> {
    tracing::debug!(
        target: "qa.handlers.identity",
        authenticated = identity.is_authenticated(),
        "Identity requested"
    );

    Json(WhoAmIResponse {
        authenticated: identity.is_authenticated(),
        user_id: identity.user_id,
        user_name: identity.user_name,
    })
}

/// Response for `GET /api/test/ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    /// Always `true`.
    pub pong: bool,
}

/// Handler for GET /api/test/ping
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { pong: true })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_whoami_anonymous() {
        let Json(response) = whoami(GatewayIdentity::default()).await;

        assert!(!response.authenticated);
        assert!(response.user_id.is_none());
    }

    #[test]
    fn test_whoami_serialization() {
        let response = WhoAmIResponse {
            authenticated: true,
            user_id: Some("42".to_string()),
            user_name: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"authenticated":true,"user_id":"42","user_name":null}"#
        );
    }
}
