//! Court Cards - the sealed, externally verifiable attendance artifact
//!
//! A card is minted exactly once at finalization when the record is not
//! auto-rejected. Card-level fields never change after mint; only
//! signatures may be appended afterward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AttendanceId, CardId, MeetingId, ParticipantId, Violation};

/// Outcome of the threshold validation at mint time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Passed,
    Failed,
    FlaggedForReview,
}

/// How much corroboration backs the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Who signed a card entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignerRole {
    Participant,
    MeetingHost,
    CourtRep,
}

/// How the signer proved themselves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignatureMethod {
    Password,
    EmailLink,
}

/// One appended signature on a Court Card.
///
/// The keypair behind `signature` is generated per signing act and
/// discarded; `public_key` is recorded for the audit trail but cannot
/// re-identify the signer later. Verification checks field presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSignature {
    pub signer_id: String,
    pub signer_name: String,
    pub signer_email: String,
    pub signer_role: SignerRole,
    pub timestamp: DateTime<Utc>,
    /// Hex-encoded detached signature over the card hash
    pub signature: String,
    /// Hex-encoded ephemeral public key
    pub public_key: String,
    pub signature_method: SignatureMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl CardSignature {
    /// Presence-of-fields validity check used by public verification
    pub fn is_well_formed(&self) -> bool {
        !self.signer_id.is_empty()
            && !self.signer_name.is_empty()
            && !self.signature.is_empty()
            && !self.public_key.is_empty()
    }
}

/// The minted Court Card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtCard {
    pub id: CardId,
    pub attendance_id: AttendanceId,
    pub participant_id: ParticipantId,
    pub meeting_id: MeetingId,
    /// Human-readable `CC-YYYY-NNNNN-SEQ`
    pub card_number: String,
    /// Hex SHA-256 over the canonical card projection
    pub card_hash: String,
    pub verification_url: String,
    /// JSON blob of `{url, cardNumber, hash, system, timestamp}`
    pub qr_code_data: String,
    pub validation_status: ValidationStatus,
    #[serde(default)]
    pub violations: Vec<Violation>,
    pub confidence_level: ConfidenceLevel,
    #[serde(default)]
    pub signatures: Vec<CardSignature>,
    /// Total hours across the participant's finalized records, this one
    /// included
    pub cumulative_hours: f64,
    pub generated_at: DateTime<Utc>,
}

impl CourtCard {
    /// Whether a signature with the given role has already been appended
    pub fn has_signature_from(&self, role: SignerRole) -> bool {
        self.signatures.iter().any(|s| s.signer_role == role)
    }
}

/// The QR payload embedded in a minted card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub url: String,
    pub card_number: String,
    pub hash: String,
    pub system: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_well_formed() {
        let sig = CardSignature {
            signer_id: "part_a".to_string(),
            signer_name: "A. Participant".to_string(),
            signer_email: "a@example.com".to_string(),
            signer_role: SignerRole::Participant,
            timestamp: Utc::now(),
            signature: "ab".repeat(64),
            public_key: "cd".repeat(32),
            signature_method: SignatureMethod::Password,
            ip_address: None,
            user_agent: None,
        };
        assert!(sig.is_well_formed());

        let hollow = CardSignature {
            signature: String::new(),
            ..sig
        };
        assert!(!hollow.is_well_formed());
    }

    #[test]
    fn test_qr_payload_wire_shape() {
        let payload = QrPayload {
            url: "https://proofmeet.example/verify/card_x".to_string(),
            card_number: "CC-2025-12345-001".to_string(),
            hash: "deadbeef".to_string(),
            system: crate::SYSTEM_TAG.to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["system"], "ProofMeet");
        assert_eq!(json["cardNumber"], "CC-2025-12345-001");
    }
}
