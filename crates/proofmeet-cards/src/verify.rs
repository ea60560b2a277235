//! Public verification of minted cards
//!
//! Everything here derives from persistent state. The output answers three
//! questions: does the card hash still match the live record, do the
//! appended signatures carry their required fields, and does the
//! participant's hash chain still hold together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use proofmeet_crypto::hash_canonical;
use proofmeet_ledger::{verify_chain, ChainVerification};
use proofmeet_types::{
    AttendanceRecord, ConfidenceLevel, CourtCard, EngagementLevel, EventSource, SignerRole,
    ValidationStatus, VerificationMethod,
};

use crate::CardProjection;

/// Per-signature presence check surfaced in verification output.
///
/// Signer keypairs are ephemeral, so this asserts the recorded fields are
/// complete; it cannot re-identify the signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureCheck {
    pub signer_name: String,
    pub signer_role: SignerRole,
    pub timestamp: DateTime<Utc>,
    pub is_valid: bool,
}

/// Condensed attendance facts shown beside the verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub join_time: DateTime<Utc>,
    pub leave_time: Option<DateTime<Utc>>,
    pub total_duration_min: i64,
    pub active_duration_min: i64,
    pub idle_duration_min: i64,
    pub attendance_percent: f64,
    /// Share of monitor events reporting video on, 0-100
    pub video_on_percent: f64,
    pub engagement_score: Option<u32>,
    pub engagement_level: Option<EngagementLevel>,
    pub activity_event_count: usize,
    pub verification_method: VerificationMethod,
    pub confidence_level: ConfidenceLevel,
}

/// The full public verification payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardVerification {
    pub card_number: String,
    pub validation_status: ValidationStatus,
    /// Recomputed projection hash matches the stored card hash
    pub hash_matches: bool,
    /// Caller-supplied `?hash=` matched the stored card hash, when given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplied_hash_matches: Option<bool>,
    pub is_tampered: bool,
    pub signatures: Vec<SignatureCheck>,
    pub chain_of_trust: ChainVerification,
    pub audit: AuditSummary,
    pub verified_at: DateTime<Utc>,
}

/// Verify a card against its live record and the participant's chain.
///
/// `chain` must be the participant's finalized records in chronological
/// order. `supplied_hash` is the optional `?hash=` query parameter.
pub fn verify_card(
    card: &CourtCard,
    record: &AttendanceRecord,
    chain: &[AttendanceRecord],
    supplied_hash: Option<&str>,
) -> CardVerification {
    let projection = CardProjection::from_record_and_card(record, card);
    let hash_matches = match hash_canonical(&projection) {
        Ok(recomputed) => recomputed == card.card_hash,
        Err(_) => false,
    };

    let supplied_hash_matches = supplied_hash.map(|h| h == card.card_hash);

    let signatures = card
        .signatures
        .iter()
        .map(|s| SignatureCheck {
            signer_name: s.signer_name.clone(),
            signer_role: s.signer_role,
            timestamp: s.timestamp,
            is_valid: s.is_well_formed(),
        })
        .collect();

    let chain_of_trust = verify_chain(chain);

    CardVerification {
        card_number: card.card_number.clone(),
        validation_status: card.validation_status,
        hash_matches,
        supplied_hash_matches,
        is_tampered: !hash_matches,
        signatures,
        chain_of_trust,
        audit: audit_summary(card, record),
        verified_at: Utc::now(),
    }
}

/// Build the audit-trail summary for a record
pub fn audit_summary(card: &CourtCard, record: &AttendanceRecord) -> AuditSummary {
    let monitor_total = record.monitor_events().count();
    let video_on = record
        .monitor_events()
        .filter(|e| e.data_flag("videoActive"))
        .count();
    let video_on_percent = if monitor_total > 0 {
        video_on as f64 / monitor_total as f64 * 100.0
    } else {
        0.0
    };

    let engagement = record.metadata.engagement.as_ref();

    AuditSummary {
        join_time: record.join_time,
        leave_time: record.leave_time,
        total_duration_min: record.total_duration_min,
        active_duration_min: record.active_duration_min,
        idle_duration_min: record.idle_duration_min,
        attendance_percent: record.attendance_percent,
        video_on_percent,
        engagement_score: engagement.map(|e| e.score),
        engagement_level: engagement.map(|e| e.level),
        activity_event_count: record
            .timeline
            .iter()
            .filter(|e| e.source == EventSource::FrontendMonitor)
            .count(),
        verification_method: record.verification_method,
        confidence_level: card.confidence_level,
    }
}
