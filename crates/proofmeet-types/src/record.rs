//! Attendance records, timelines, and absence accounting
//!
//! One `AttendanceRecord` exists per (participant, meeting, day)
//! join-episode bundle. All ingress channels mutate the same record; the
//! timeline is append-only and every derived field can be recomputed from
//! it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AttendanceId, CourtRepId, EngagementAnalysis, EventSource, EventType, FraudAnalysis,
    MeetingId, ParticipantId, TimelineEvent,
};

// ============================================================================
// Status & verification
// ============================================================================

/// Lifecycle state of an attendance record.
///
/// COMPLETED is provisional: the participant left but the scheduled meeting
/// window is still open, so they may rejoin. FINALIZED and REJECTED are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    InProgress,
    Completed,
    Finalized,
    Rejected,
}

impl AttendanceStatus {
    /// Terminal states reject all further mutation except card signatures
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Rejected)
    }
}

/// How the attendance was corroborated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationMethod {
    ZoomWebhook,
    ScreenActivity,
    Both,
    None,
}

// ============================================================================
// Absence periods
// ============================================================================

/// How an absence period was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbsenceDetection {
    /// Re-join against an IN_PROGRESS record whose monitor went quiet
    StaleInProgress,
    /// Re-join against a provisional COMPLETED record inside the window
    ExplicitRejoin,
    /// Gap bounded by a webhook leave/join pair
    WebhookLeave,
}

/// A `{leftAt, rejoinedAt, absenceMinutes}` interval subtracted from raw
/// duration to yield net duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsencePeriod {
    pub left_at: DateTime<Utc>,
    pub rejoined_at: DateTime<Utc>,
    pub absence_minutes: i64,
    pub detected_from: AbsenceDetection,
}

impl AbsencePeriod {
    pub fn new(
        left_at: DateTime<Utc>,
        rejoined_at: DateTime<Utc>,
        detected_from: AbsenceDetection,
    ) -> Self {
        let absence_minutes = (rejoined_at - left_at).num_minutes().max(0);
        Self {
            left_at,
            rejoined_at,
            absence_minutes,
            detected_from,
        }
    }
}

// ============================================================================
// Ledger link
// ============================================================================

/// The sealed block written into a record at finalization.
///
/// `previous_hash` back-references the participant's immediately prior
/// finalized record (or the `"0"` sentinel); it is a lookup, never
/// ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerLink {
    pub previous_hash: String,
    pub block_hash: String,
    pub block_signature: String,
    pub signer_public_key: String,
}

// ============================================================================
// Record metadata
// ============================================================================

/// Derived and audit fields carried by an attendance record.
///
/// The typed fields are the ones the engine reasons about; `extra` holds
/// free-form audit breadcrumbs (webhook payload fragments, monitor device
/// info) that only ever round-trip to verification output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    #[serde(default)]
    pub absence_periods: Vec<AbsencePeriod>,
    #[serde(default)]
    pub rejoin_count: u32,
    /// Set on a provisional leave while the window is still open
    #[serde(default)]
    pub temporary_leave: bool,
    #[serde(default)]
    pub meeting_still_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<EngagementAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud: Option<FraudAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<LedgerLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_by: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RecordMetadata {
    /// Sum of all recorded absence minutes
    pub fn absence_minutes_total(&self) -> i64 {
        self.absence_periods.iter().map(|p| p.absence_minutes).sum()
    }
}

// ============================================================================
// Attendance record
// ============================================================================

/// The authoritative per-meeting-per-participant attendance object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub participant_id: ParticipantId,
    pub court_rep_id: CourtRepId,
    pub meeting_id: MeetingId,
    pub meeting_name: String,
    pub meeting_program: String,
    pub meeting_date: NaiveDate,
    /// First join of the bundle; immutable once set
    pub join_time: DateTime<Utc>,
    /// Last observed leave, or the finalization time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave_time: Option<DateTime<Utc>>,
    /// Net minutes, excluding absence gaps
    pub total_duration_min: i64,
    pub active_duration_min: i64,
    pub idle_duration_min: i64,
    /// Net duration over scheduled duration, clamped to [0, 100]
    pub attendance_percent: f64,
    pub status: AttendanceStatus,
    /// Set at finalization; None while the record is live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
    pub verification_method: VerificationMethod,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default)]
    pub metadata: RecordMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Open a fresh IN_PROGRESS record at `join_time`
    pub fn open(
        participant_id: ParticipantId,
        court_rep_id: CourtRepId,
        meeting: &crate::Meeting,
        join_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AttendanceId::new(),
            participant_id,
            court_rep_id,
            meeting_id: meeting.id.clone(),
            meeting_name: meeting.name.clone(),
            meeting_program: meeting.program.clone(),
            meeting_date: meeting.date(),
            join_time,
            leave_time: None,
            total_duration_min: 0,
            active_duration_min: 0,
            idle_duration_min: 0,
            attendance_percent: 0.0,
            status: AttendanceStatus::InProgress,
            is_valid: None,
            verification_method: VerificationMethod::None,
            timeline: Vec::new(),
            metadata: RecordMetadata::default(),
            created_at: join_time,
            updated_at: join_time,
        }
    }

    /// Wall-clock minutes between join and leave (zero while still open)
    pub fn raw_duration_minutes(&self) -> i64 {
        match self.leave_time {
            Some(leave) => (leave - self.join_time).num_minutes().max(0),
            None => 0,
        }
    }

    /// Events from the participant-side monitor, in append order
    pub fn monitor_events(&self) -> impl Iterator<Item = &TimelineEvent> {
        self.timeline.iter().filter(|e| e.is_monitor_event())
    }

    /// The most recent monitor event, if any
    pub fn last_monitor_event(&self) -> Option<&TimelineEvent> {
        self.monitor_events().last()
    }

    /// Count of timeline events of one (type, source) pair
    pub fn count_events(&self, event_type: EventType, source: EventSource) -> u32 {
        self.timeline
            .iter()
            .filter(|e| e.event_type == event_type && e.source == source)
            .count() as u32
    }

    /// Whether any webhook-sourced event reached this record
    pub fn has_webhook_events(&self) -> bool {
        self.timeline
            .iter()
            .any(|e| e.source == EventSource::Webhook)
    }

    /// Re-derive the verification method from the observed sources
    pub fn derive_verification_method(&self) -> VerificationMethod {
        let webhook = self.has_webhook_events();
        let monitor = self.timeline.iter().any(|e| e.is_monitor_event());
        match (webhook, monitor) {
            (true, true) => VerificationMethod::Both,
            (true, false) => VerificationMethod::ZoomWebhook,
            (false, true) => VerificationMethod::ScreenActivity,
            (false, false) => VerificationMethod::None,
        }
    }

    /// Duration between the first webhook JOINED and last webhook LEFT, if
    /// both exist. Used to cross-check tracked duration.
    pub fn webhook_span_minutes(&self) -> Option<i64> {
        let first_join = self
            .timeline
            .iter()
            .find(|e| e.source == EventSource::Webhook && e.event_type == EventType::Joined)?;
        let last_left = self
            .timeline
            .iter()
            .filter(|e| e.source == EventSource::Webhook && e.event_type == EventType::Left)
            .last()?;
        Some((last_left.timestamp - first_join.timestamp).num_minutes().max(0))
    }

    /// Check the duration bookkeeping invariants
    pub fn duration_invariants_hold(&self) -> bool {
        let raw = self.raw_duration_minutes();
        let absence = self.metadata.absence_minutes_total();
        self.total_duration_min >= 0
            && self.total_duration_min <= raw
            && self.total_duration_min + absence <= raw + 1
            && (0.0..=100.0).contains(&self.attendance_percent)
    }
}
