//! Participant attendance handlers
//!
//! Join, leave, and heartbeat intake. Each call re-reads the record under
//! its lock inside the engine; handlers only translate DTOs.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use proofmeet_types::{EventType, MeetingId};

use crate::{
    dto::{
        HeartbeatRequest, HeartbeatResponse, JoinMeetingRequest, JoinMeetingResponse,
        LeaveMeetingRequest, LeaveMeetingResponse,
    },
    error::{ApiError, ApiResult},
    extractors::AuthenticatedParticipant,
    state::AppState,
};

/// POST /api/join-meeting
pub async fn join_meeting(
    State(state): State<Arc<AppState>>,
    AuthenticatedParticipant(participant): AuthenticatedParticipant,
    Json(request): Json<JoinMeetingRequest>,
) -> ApiResult<(StatusCode, Json<JoinMeetingResponse>)> {
    if request.meeting_id.trim().is_empty() {
        return Err(ApiError::BadRequest("meetingId must not be empty".to_string()));
    }

    tracing::debug!(
        participant = %participant.id,
        meeting = %request.meeting_id,
        method = ?request.join_method,
        "join-meeting request"
    );

    let outcome = state
        .engine
        .join_meeting(&participant.id, &MeetingId::from_string(request.meeting_id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(JoinMeetingResponse {
            attendance_id: outcome.attendance_id.to_string(),
            join_time: outcome.join_time,
            tracking_active: outcome.tracking_active,
            meeting_url: outcome.meeting_url,
            rejoin_detected: outcome.rejoin_detected,
            absence_minutes: outcome.absence_minutes,
        }),
    ))
}

/// POST /api/leave-meeting
pub async fn leave_meeting(
    State(state): State<Arc<AppState>>,
    AuthenticatedParticipant(participant): AuthenticatedParticipant,
    Json(request): Json<LeaveMeetingRequest>,
) -> ApiResult<Json<LeaveMeetingResponse>> {
    let attendance_id = require_attendance_id(&request.attendance_id)?;
    let outcome = state
        .engine
        .leave_meeting(&attendance_id, &participant.id)
        .await?;

    let message = if outcome.can_rejoin {
        format!(
            "You may rejoin within {} minutes; your Court Card is generated when the meeting ends.",
            outcome.minutes_until_close
        )
    } else if outcome.court_card_generated {
        "Meeting ended. Your Court Card has been generated.".to_string()
    } else {
        "Meeting ended. This attendance did not qualify for a Court Card.".to_string()
    };

    Ok(Json(LeaveMeetingResponse {
        attendance_id: outcome.attendance_id.to_string(),
        duration: outcome.duration_min,
        total_duration: outcome.total_duration_min,
        absence_time: outcome.absence_minutes,
        attendance_percentage: outcome.attendance_percent,
        status: outcome.status,
        court_card_generated: outcome.court_card_generated,
        can_rejoin: outcome.can_rejoin,
        minutes_until_close: outcome.can_rejoin.then_some(outcome.minutes_until_close),
        message,
    }))
}

/// POST /api/activity-heartbeat
pub async fn activity_heartbeat(
    State(state): State<Arc<AppState>>,
    AuthenticatedParticipant(participant): AuthenticatedParticipant,
    Json(request): Json<HeartbeatRequest>,
) -> ApiResult<Json<HeartbeatResponse>> {
    let attendance_id = require_attendance_id(&request.attendance_id)?;
    let activity = match request.activity_type.as_str() {
        "ACTIVE" => EventType::Active,
        "IDLE" => EventType::Idle,
        other => {
            return Err(ApiError::BadRequest(format!(
                "activityType must be ACTIVE or IDLE, got {other}"
            )))
        }
    };

    let outcome = state
        .engine
        .record_heartbeat(&attendance_id, &participant.id, activity, request.metadata)
        .await?;

    Ok(Json(HeartbeatResponse {
        attendance_id: outcome.attendance_id.to_string(),
        active_duration_min: outcome.active_duration_min,
        idle_duration_min: outcome.idle_duration_min,
        timeline_events: outcome.timeline_events,
    }))
}

fn require_attendance_id(raw: &str) -> ApiResult<proofmeet_types::AttendanceId> {
    if raw.trim().is_empty() {
        return Err(ApiError::BadRequest("attendanceId must not be empty".to_string()));
    }
    Ok(proofmeet_types::AttendanceId::from_string(raw))
}
