//! ProofMeet Cards - the sealed Court Card artifact
//!
//! Minting assembles a card from a finalizing record, hashes its canonical
//! projection, and embeds a QR payload pointing at the public verification
//! URL. Verification recomputes everything from persistent state: no
//! session, no cache, no authentication.

pub mod mint;
pub mod verify;

pub use mint::*;
pub use verify::*;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use proofmeet_types::{
    AttendanceRecord, CourtCard, ValidationStatus, Violation,
};

/// The canonical projection a card hash covers.
///
/// Recomputable at verification time from the live record plus the card's
/// own sealed fields; any drift in either flips the tamper check. Field
/// order is load-bearing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardProjection {
    pub participant_id: String,
    pub meeting_id: String,
    pub meeting_name: String,
    pub meeting_date: NaiveDate,
    pub join_time: DateTime<Utc>,
    pub leave_time: Option<DateTime<Utc>>,
    pub total_duration_min: i64,
    pub active_duration_min: i64,
    pub idle_duration_min: i64,
    pub attendance_percent: f64,
    pub validation_status: ValidationStatus,
    pub violations: Vec<Violation>,
    pub generated_at: DateTime<Utc>,
}

impl CardProjection {
    /// Project the live record against a card's sealed fields
    pub fn from_parts(
        record: &AttendanceRecord,
        validation_status: ValidationStatus,
        violations: &[Violation],
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            participant_id: record.participant_id.to_string(),
            meeting_id: record.meeting_id.to_string(),
            meeting_name: record.meeting_name.clone(),
            meeting_date: record.meeting_date,
            join_time: record.join_time,
            leave_time: record.leave_time,
            total_duration_min: record.total_duration_min,
            active_duration_min: record.active_duration_min,
            idle_duration_min: record.idle_duration_min,
            attendance_percent: record.attendance_percent,
            validation_status,
            violations: violations.to_vec(),
            generated_at,
        }
    }

    /// Project the live record against an existing card
    pub fn from_record_and_card(record: &AttendanceRecord, card: &CourtCard) -> Self {
        Self::from_parts(
            record,
            card.validation_status,
            &card.violations,
            card.generated_at,
        )
    }
}
