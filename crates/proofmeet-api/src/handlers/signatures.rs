//! Signature intake handlers
//!
//! Participant self-sign (password re-verified) and host attestation via a
//! one-use emailed link.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use proofmeet_engine::{HostSignatureSubmission, HostSignSummary};
use proofmeet_types::{AttendanceId, CardId, ProofMeetError};

use crate::{
    dto::{
        HostLinkRequest, HostLinkResponse, HostSignatureRequestDto, HostSignatureResponse,
        HostSummaryQuery, SignCardRequest, SignCardResponse,
    },
    error::{ApiError, ApiResult},
    extractors::{AuthenticatedParticipant, ClientIp, UserAgent},
    state::AppState,
};

/// POST /api/sign-court-card/:cardId
pub async fn sign_court_card(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<String>,
    AuthenticatedParticipant(participant): AuthenticatedParticipant,
    ClientIp(client_ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    Json(request): Json<SignCardRequest>,
) -> ApiResult<Json<SignCardResponse>> {
    let verified = state
        .passwords
        .verify_password(&request.password, &participant.password_hash)?;
    if !verified {
        return Err(ProofMeetError::PasswordMismatch.into());
    }

    let card = state
        .engine
        .sign_card_as_participant(
            &CardId::from_string(card_id),
            &participant,
            client_ip,
            user_agent,
        )
        .await?;

    Ok(Json(SignCardResponse {
        card_id: card.id.to_string(),
        card_number: card.card_number,
        signature_count: card.signatures.len(),
    }))
}

/// POST /api/host-signature-link - mint a one-use host attestation link
pub async fn request_host_link(
    State(state): State<Arc<AppState>>,
    AuthenticatedParticipant(participant): AuthenticatedParticipant,
    Json(request): Json<HostLinkRequest>,
) -> ApiResult<(StatusCode, Json<HostLinkResponse>)> {
    if request.attendance_id.trim().is_empty() {
        return Err(ApiError::BadRequest("attendanceId must not be empty".to_string()));
    }

    let link = state
        .engine
        .request_host_signature(
            &AttendanceId::from_string(request.attendance_id),
            &participant.id,
            request.host_email,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(HostLinkResponse {
            attendance_record_id: link.attendance_record_id.to_string(),
            verification_code: link.verification_code,
            created_at: link.created_at,
        }),
    ))
}

/// GET /verification/host-signature/:recordId?code= - host landing page
/// summary; does not consume the code
pub async fn host_summary(
    State(state): State<Arc<AppState>>,
    Path(record_id): Path<String>,
    Query(query): Query<HostSummaryQuery>,
) -> ApiResult<Json<HostSignSummary>> {
    let summary = state
        .engine
        .host_signature_summary(&AttendanceId::from_string(record_id), &query.code)
        .await?;
    Ok(Json(summary))
}

/// POST /verification/host-signature - consume the code, append the
/// host's signature
pub async fn submit_host_signature(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    Json(request): Json<HostSignatureRequestDto>,
) -> ApiResult<(StatusCode, Json<HostSignatureResponse>)> {
    let card = state
        .engine
        .submit_host_signature(HostSignatureSubmission {
            attendance_record_id: AttendanceId::from_string(request.attendance_record_id),
            host_name: request.host_name,
            host_email: request.host_email,
            signature_data: request.signature_data,
            verification_code: request.verification_code,
            ip_address: client_ip,
            user_agent,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(HostSignatureResponse {
            card_number: card.card_number,
            signature_count: card.signatures.len(),
            signed_at: Utc::now(),
        }),
    ))
}
