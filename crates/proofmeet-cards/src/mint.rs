//! Court Card minting
//!
//! A card is minted exactly once, at finalization, when the record was not
//! auto-rejected. No signature is applied at mint; signatures arrive later
//! through the intake endpoints.

use chrono::{Datelike, Utc};
use rand::Rng;

use proofmeet_crypto::hash_canonical;
use proofmeet_types::{
    AttendanceRecord, CardId, ConfidenceLevel, CourtCard, ProofMeetError, QrPayload, Result,
    ValidationStatus, VerificationMethod, Violation, SYSTEM_TAG,
};

use crate::CardProjection;

/// Builds Court Cards against a configured frontend base URL
#[derive(Debug, Clone)]
pub struct CardMinter {
    /// Base of the public verification frontend, without trailing slash
    frontend_base: String,
}

impl CardMinter {
    pub fn new(frontend_base: impl Into<String>) -> Self {
        let mut frontend_base = frontend_base.into();
        while frontend_base.ends_with('/') {
            frontend_base.pop();
        }
        Self { frontend_base }
    }

    /// Mint the card for a finalizing record.
    ///
    /// `year_sequence` is the 1-based count of cards minted this calendar
    /// year; `cumulative_hours` covers the participant's finalized records
    /// including this one.
    pub fn mint(
        &self,
        record: &AttendanceRecord,
        validation_status: ValidationStatus,
        violations: Vec<Violation>,
        cumulative_hours: f64,
        year_sequence: u32,
    ) -> Result<CourtCard> {
        let generated_at = Utc::now();
        let card_number = allocate_card_number(generated_at.year(), year_sequence);

        let projection =
            CardProjection::from_parts(record, validation_status, &violations, generated_at);
        let card_hash = hash_canonical(&projection).map_err(|e| ProofMeetError::Crypto {
            message: e.to_string(),
        })?;

        let id = CardId::new();
        let verification_url = format!("{}/verify/{}", self.frontend_base, id);

        let qr_payload = QrPayload {
            url: verification_url.clone(),
            card_number: card_number.clone(),
            hash: card_hash.clone(),
            system: SYSTEM_TAG.to_string(),
            timestamp: generated_at,
        };
        let qr_code_data = serde_json::to_string(&qr_payload)
            .map_err(|e| ProofMeetError::internal(e.to_string()))?;

        Ok(CourtCard {
            id,
            attendance_id: record.id.clone(),
            participant_id: record.participant_id.clone(),
            meeting_id: record.meeting_id.clone(),
            card_number,
            card_hash,
            verification_url,
            qr_code_data,
            validation_status,
            violations,
            confidence_level: derive_confidence(record, validation_status),
            signatures: Vec::new(),
            cumulative_hours,
            generated_at,
        })
    }
}

/// Allocate a human-readable card number: `CC-<year>-<5-digit-random>-<seq>`
fn allocate_card_number(year: i32, year_sequence: u32) -> String {
    let random: u32 = rand::thread_rng().gen_range(0..100_000);
    format!("CC-{year}-{random:05}-{:03}", year_sequence.min(999))
}

/// Confidence follows corroboration: both channels observed means high,
/// one means medium, none means low; a flagged card never reads high.
fn derive_confidence(record: &AttendanceRecord, status: ValidationStatus) -> ConfidenceLevel {
    let base = match record.verification_method {
        VerificationMethod::Both => ConfidenceLevel::High,
        VerificationMethod::ZoomWebhook | VerificationMethod::ScreenActivity => {
            ConfidenceLevel::Medium
        }
        VerificationMethod::None => ConfidenceLevel::Low,
    };
    if status == ValidationStatus::FlaggedForReview && base == ConfidenceLevel::High {
        ConfidenceLevel::Medium
    } else {
        base
    }
}
