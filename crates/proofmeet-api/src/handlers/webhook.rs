//! Webhook intake
//!
//! Deliveries are verified against the shared secret before parsing. A
//! signature mismatch or an unmatched participant drops the event with a
//! log line and no client feedback - the provider always gets an ack.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};

use proofmeet_engine::WebhookEvent;

use crate::{
    dto::{WebhookAck, WebhookChallengeQuery},
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Header carrying the HMAC-SHA256 signature of the raw body
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// GET /webhooks/video - endpoint validation challenge
pub async fn challenge(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebhookChallengeQuery>,
) -> String {
    state.webhook.challenge_response(&query.token)
}

/// POST /webhooks/video
pub async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if state.webhook.verify(&body, signature).is_err() {
        // Integrity failure: drop, log, acknowledge
        tracing::warn!("webhook delivery with bad signature dropped");
        return Ok(Json(WebhookAck { received: true }));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("malformed webhook payload: {e}")))?;

    let disposition = state.engine.ingest_webhook(event).await?;
    tracing::debug!(?disposition, "webhook delivery processed");

    Ok(Json(WebhookAck { received: true }))
}
