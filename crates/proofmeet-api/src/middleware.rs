//! Request middleware
//!
//! Bearer-token authentication for the participant API. The middleware
//! resolves the session token to a participant account and stashes it in
//! request extensions for the `AuthenticatedParticipant` extractor.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::header::AUTHORIZATION;

use crate::{error::ApiError, extractors::AuthenticatedParticipant, state::AppState};

/// Authenticate the request or fail with 401
pub async fn require_participant(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return ApiError::Unauthorized.into_response();
    };

    let participant_id = match state.sessions.authenticate(token).await {
        Ok(id) => id,
        Err(_) => return ApiError::Unauthorized.into_response(),
    };

    let Some(participant) = state.engine.participants().get(&participant_id).await else {
        tracing::warn!(participant = %participant_id, "session for unknown participant");
        return ApiError::Unauthorized.into_response();
    };

    request
        .extensions_mut()
        .insert(AuthenticatedParticipant(participant));
    next.run(request).await
}
