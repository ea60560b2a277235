//! Public verification handlers
//!
//! No authentication, no session: everything in the response derives from
//! persistent state. The only side effect is an access audit entry.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use proofmeet_cards::CardVerification;
use proofmeet_ledger::ChainVerification;
use proofmeet_types::CardId;

use crate::{
    dto::VerifyQuery,
    error::ApiResult,
    extractors::{ClientIp, UserAgent},
    state::AppState,
};

/// GET /verify/:cardId[?hash=]
pub async fn verify_card(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<String>,
    Query(query): Query<VerifyQuery>,
    ClientIp(client_ip): ClientIp,
    UserAgent(user_agent): UserAgent,
) -> ApiResult<Json<CardVerification>> {
    let verification = state
        .engine
        .verify_card_public(
            &CardId::from_string(card_id),
            query.hash.as_deref(),
            client_ip,
            user_agent,
        )
        .await?;
    Ok(Json(verification))
}

/// GET /verify/:cardId/chain-of-trust
pub async fn chain_of_trust(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<String>,
) -> ApiResult<Json<ChainVerification>> {
    let chain = state
        .engine
        .chain_of_trust(&CardId::from_string(card_id))
        .await?;
    Ok(Json(chain))
}
