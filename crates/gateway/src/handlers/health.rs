//! Health check handler.

use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Response for `/actuator/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "UP" while the process is serving requests.
    pub status: String,

    /// Registered sessions, including expired entries not yet swept.
    pub sessions: usize,
}

/// Liveness probe. Internal path: no credential or trust header needed.
#[instrument(skip_all, name = "gateway.health.check")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
        sessions: state.sessions.registry().len(),
    })
}
