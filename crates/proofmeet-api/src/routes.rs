//! API routes
//!
//! Route definitions for all endpoints. Participant routes sit behind the
//! bearer-token middleware; webhooks, host attestation, and public
//! verification do not.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, middleware, state::AppState, ApiConfig};

/// Build the full application router
pub fn create_router(state: Arc<AppState>, config: ApiConfig) -> Router {
    let mut router = Router::new()
        .merge(public_routes())
        .nest("/api", participant_routes(state.clone()))
        .with_state(state);

    if config.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if config.enable_trace {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

/// Routes reachable without authentication
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health))
        // Webhook intake (shared-secret verified in the handler)
        .route("/webhooks/video", get(handlers::webhook::challenge))
        .route("/webhooks/video", post(handlers::webhook::receive))
        // Host attestation via one-use code
        .route(
            "/verification/host-signature/:record_id",
            get(handlers::signatures::host_summary),
        )
        .route(
            "/verification/host-signature",
            post(handlers::signatures::submit_host_signature),
        )
        // Public card verification
        .route("/verify/:card_id", get(handlers::verification::verify_card))
        .route(
            "/verify/:card_id/chain-of-trust",
            get(handlers::verification::chain_of_trust),
        )
}

/// Token-authenticated participant routes
fn participant_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/join-meeting", post(handlers::attendance::join_meeting))
        .route("/leave-meeting", post(handlers::attendance::leave_meeting))
        .route(
            "/activity-heartbeat",
            post(handlers::attendance::activity_heartbeat),
        )
        .route(
            "/sign-court-card/:card_id",
            post(handlers::signatures::sign_court_card),
        )
        .route(
            "/host-signature-link",
            post(handlers::signatures::request_host_link),
        )
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_participant,
        ))
}
