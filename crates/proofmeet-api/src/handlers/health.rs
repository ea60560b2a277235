//! Health endpoint

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{dto::HealthResponse, state::AppState};

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        server_time: Utc::now(),
        meetings: state.engine.meetings().len().await,
        participants: state.engine.participants().len().await,
    })
}
