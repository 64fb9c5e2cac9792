//! Login and registration pass-through.
//!
//! The user service signs the credential; the gateway forwards the request
//! unchanged and registers whatever credential comes back, so that renewal,
//! logout and session enforcement cover it from the first request.

use crate::errors::GatewayError;
use crate::routes::AppState;
use crate::services::proxy::MAX_PROXY_BODY_BYTES;
use axum::{
    body::Body,
    extract::{Request, State},
    response::Response,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/user/login and POST /api/user/register
///
/// The upstream response is returned to the client byte for byte. A
/// credential that fails to decode is not registered; the client still gets
/// the upstream answer.
#[instrument(skip_all, name = "gateway.handlers.auth.passthrough")]
pub async fn auth_passthrough(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, GatewayError> {
    let response = state.proxy.forward(request).await?;
    if !response.status().is_success() {
        return Ok(response);
    }

    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_PROXY_BODY_BYTES)
        .await
        .map_err(|e| {
            GatewayError::UpstreamUnavailable(format!("unreadable login response: {e}"))
        })?;

    match issued_token(&bytes) {
        Some(token) => {
            if let Err(e) = state.sessions.register(&token) {
                tracing::warn!(
                    target: "gateway.handlers.auth",
                    error = %e,
                    "Upstream credential not registered"
                );
            }
        }
        None => {
            tracing::debug!(target: "gateway.handlers.auth", "No credential in upstream response");
        }
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

/// Find the credential in a login response: either `token` at the top level
/// or inside a `data` envelope.
fn issued_token(body: &[u8]) -> Option<String> {
    let json: Value = serde_json::from_slice(body).ok()?;
    json.get("token")
        .or_else(|| json.get("data").and_then(|data| data.get("token")))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_top_level_and_enveloped() {
        assert_eq!(
            issued_token(br#"{"token":"abc","type":"Bearer","id":1,"username":"alice"}"#),
            Some("abc".to_string())
        );
        assert_eq!(
            issued_token(br#"{"code":200,"data":{"token":"xyz"}}"#),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn test_issued_token_absent() {
        for body in [
            &b"not json"[..],
            br#"{"message":"registered"}"#,
            br#"{"token":""}"#,
            br#"{"token":42}"#,
            br#"{"data":null}"#,
        ] {
            assert_eq!(issued_token(body), None, "{}", String::from_utf8_lossy(body));
        }
    }
}
