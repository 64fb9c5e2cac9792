//! Fallback handler forwarding everything not served locally.

use crate::errors::GatewayError;
use crate::routes::AppState;
use axum::{
    extract::{Request, State},
    response::Response,
};
use std::sync::Arc;

/// Forward the (already authenticated and mutated) request upstream.
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, GatewayError> {
    state.proxy.forward(request).await
}
