//! Request and response DTOs
//!
//! Wire names are camelCase throughout, matching the frontend monitor and
//! the minted QR payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use proofmeet_types::AttendanceStatus;

// ============================================================================
// Participant API
// ============================================================================

/// How the participant says they are attending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinMethod {
    Online,
    InPerson,
}

impl Default for JoinMethod {
    fn default() -> Self {
        Self::Online
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinMeetingRequest {
    pub meeting_id: String,
    #[serde(default)]
    pub join_method: JoinMethod,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinMeetingResponse {
    pub attendance_id: String,
    pub join_time: DateTime<Utc>,
    pub tracking_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_url: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub rejoin_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absence_minutes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveMeetingRequest {
    pub attendance_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveMeetingResponse {
    pub attendance_id: String,
    /// Wall-clock minutes from join to leave
    pub duration: i64,
    /// Net minutes after subtracting absences
    pub total_duration: i64,
    pub absence_time: i64,
    pub attendance_percentage: f64,
    pub status: AttendanceStatus,
    pub court_card_generated: bool,
    pub can_rejoin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_until_close: Option<i64>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub attendance_id: String,
    /// ACTIVE or IDLE
    pub activity_type: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub attendance_id: String,
    pub active_duration_min: i64,
    pub idle_duration_min: i64,
    pub timeline_events: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignCardRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignCardResponse {
    pub card_id: String,
    pub card_number: String,
    pub signature_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostLinkRequest {
    pub attendance_id: String,
    #[serde(default)]
    pub host_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostLinkResponse {
    pub attendance_record_id: String,
    pub verification_code: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Host API
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct HostSummaryQuery {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSignatureRequestDto {
    pub attendance_record_id: String,
    pub host_name: String,
    pub host_email: String,
    pub signature_data: String,
    pub verification_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSignatureResponse {
    pub card_number: String,
    pub signature_count: usize,
    pub signed_at: DateTime<Utc>,
}

// ============================================================================
// Public verification
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub hash: Option<String>,
}

// ============================================================================
// Webhooks
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookChallengeQuery {
    pub token: String,
}

/// Webhooks are always acknowledged; dropped events give no client feedback
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub server_time: DateTime<Utc>,
    pub meetings: usize,
    pub participants: usize,
}
