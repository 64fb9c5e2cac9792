//! Session renewal and logout handlers.
//!
//! Both paths are authentication-required, so by the time a handler runs the
//! edge interceptor has already verified the bearer credential.

use crate::errors::GatewayError;
use crate::middleware::extract_bearer_token;
use crate::routes::AppState;
use crate::session::RenewOutcome;
use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Response for `POST /api/session/renew`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewResponse {
    /// Credential the client should use from now on.
    pub token: String,

    /// Whether `token` differs from the presented credential.
    pub renewed: bool,

    /// Expiry of a newly issued credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Handler for POST /api/session/renew
///
/// Re-issues the credential when it is close to expiry, otherwise echoes it
/// back unchanged.
#[instrument(skip_all, name = "gateway.handlers.session.renew")]
pub async fn renew_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RenewResponse>, GatewayError> {
    let token = extract_bearer_token(&headers)?;

    let response = match state.sessions.renew_if_needed(token)? {
        RenewOutcome::Unchanged => RenewResponse {
            token: token.to_string(),
            renewed: false,
            expires_at: None,
        },
        RenewOutcome::Renewed(issued) => RenewResponse {
            token: issued.token,
            renewed: true,
            expires_at: Some(issued.expires_at),
        },
    };

    Ok(Json(response))
}

/// Handler for POST /api/session/logout
///
/// Drops the credential's registry entry. Returns 204 even when it was
/// already gone.
#[instrument(skip_all, name = "gateway.handlers.session.logout")]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, GatewayError> {
    let token = extract_bearer_token(&headers)?;
    state.sessions.revoke(token);
    Ok(StatusCode::NO_CONTENT)
}
