//! Card operations: signature intake and public verification
//!
//! Two signature channels append to an already-minted card: the
//! participant signs with a re-verified password, and the meeting host
//! signs through a one-use emailed link. Neither recomputes the card hash
//! - the card is sealed - but each signature carries its own timestamp and
//! ephemeral key material.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use proofmeet_cards::{verify_card, CardVerification};
use proofmeet_crypto::ephemeral_sign;
use proofmeet_ledger::{verify_chain, ChainVerification};
use proofmeet_store::{AttendanceStore, HostSignatureRequest};
use proofmeet_types::{
    AttendanceId, CardId, CardSignature, CourtCard, Participant, ParticipantId, ProofMeetError,
    Result, SignatureMethod, SignerRole,
};

use crate::AttendanceEngine;

/// Meeting summary shown on the host sign-in page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSignSummary {
    pub attendance_record_id: AttendanceId,
    pub participant_name: String,
    pub meeting_name: String,
    pub meeting_date: NaiveDate,
    pub total_duration_min: i64,
    pub attendance_percent: f64,
}

/// Host attestation form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSignatureSubmission {
    pub attendance_record_id: AttendanceId,
    pub host_name: String,
    pub host_email: String,
    /// Drawn or typed signature payload from the form
    pub signature_data: String,
    pub verification_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl AttendanceEngine {
    // ======================================================================
    // Public verification
    // ======================================================================

    /// Verify a card without authentication. The only side effect is one
    /// access audit entry.
    pub async fn verify_card_public(
        &self,
        card_id: &CardId,
        supplied_hash: Option<&str>,
        client_ip: Option<String>,
        user_agent: Option<String>,
    ) -> Result<CardVerification> {
        let card = self.require_card(card_id).await?;
        let record = self
            .store
            .get_record(&card.attendance_id)
            .await?
            .ok_or_else(|| {
                ProofMeetError::internal(format!(
                    "card {} references missing record {}",
                    card.id, card.attendance_id
                ))
            })?;
        let chain = self
            .store
            .participant_chain(&card.participant_id, false)
            .await?;

        let verification = verify_card(&card, &record, &chain, supplied_hash);

        self.store
            .record_access(proofmeet_store::AccessAuditEntry {
                card_id: card.id.clone(),
                accessed_at: Utc::now(),
                hash_supplied: supplied_hash.is_some(),
                client_ip,
                user_agent,
            })
            .await?;

        Ok(verification)
    }

    /// Verify only the participant's chain of trust behind a card
    pub async fn chain_of_trust(&self, card_id: &CardId) -> Result<ChainVerification> {
        let card = self.require_card(card_id).await?;
        let chain = self
            .store
            .participant_chain(&card.participant_id, false)
            .await?;
        Ok(verify_chain(&chain))
    }

    // ======================================================================
    // Participant self-sign
    // ======================================================================

    /// Append the participant's own signature. The caller must have
    /// re-verified the participant's password already.
    pub async fn sign_card_as_participant(
        &self,
        card_id: &CardId,
        participant: &Participant,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<CourtCard> {
        let card = self.require_card(card_id).await?;
        if card.participant_id != participant.id {
            return Err(ProofMeetError::NotOwner);
        }
        if card.has_signature_from(SignerRole::Participant) {
            return Err(ProofMeetError::AlreadySigned {
                role: "PARTICIPANT".to_string(),
            });
        }

        let (signature, public_key) =
            ephemeral_sign(card.card_hash.as_bytes()).map_err(|e| ProofMeetError::Crypto {
                message: e.to_string(),
            })?;

        self.store
            .append_signature(
                &card.id,
                CardSignature {
                    signer_id: participant.id.to_string(),
                    signer_name: participant.display_name.clone(),
                    signer_email: participant.email.clone(),
                    signer_role: SignerRole::Participant,
                    timestamp: Utc::now(),
                    signature,
                    public_key,
                    signature_method: SignatureMethod::Password,
                    ip_address,
                    user_agent,
                },
            )
            .await
    }

    // ======================================================================
    // Host attestation
    // ======================================================================

    /// Mint a one-use host-signature link for the participant's own record
    pub async fn request_host_signature(
        &self,
        attendance_id: &AttendanceId,
        caller: &ParticipantId,
        host_email: Option<String>,
    ) -> Result<HostSignatureRequest> {
        let record = self.store.get_record(attendance_id).await?.ok_or_else(|| {
            ProofMeetError::RecordNotFound {
                attendance_id: attendance_id.to_string(),
            }
        })?;
        if record.participant_id != *caller {
            return Err(ProofMeetError::NotOwner);
        }
        Ok(self.host_codes.create(attendance_id.clone(), host_email).await)
    }

    /// Meeting summary for the host sign-in page. Does not consume the
    /// code.
    pub async fn host_signature_summary(
        &self,
        attendance_id: &AttendanceId,
        code: &str,
    ) -> Result<HostSignSummary> {
        let request = self
            .host_codes
            .peek(code)
            .await
            .ok_or(ProofMeetError::CodeInvalidOrUsed)?;
        if request.attendance_record_id != *attendance_id {
            return Err(ProofMeetError::CodeInvalidOrUsed);
        }

        let record = self.store.get_record(attendance_id).await?.ok_or_else(|| {
            ProofMeetError::RecordNotFound {
                attendance_id: attendance_id.to_string(),
            }
        })?;
        let participant_name = self
            .participants
            .get(&record.participant_id)
            .await
            .map(|p| p.display_name)
            .unwrap_or_else(|| record.participant_id.to_string());

        Ok(HostSignSummary {
            attendance_record_id: record.id.clone(),
            participant_name,
            meeting_name: record.meeting_name.clone(),
            meeting_date: record.meeting_date,
            total_duration_min: record.total_duration_min,
            attendance_percent: record.attendance_percent,
        })
    }

    /// Apply a host attestation. The verification code is consumed exactly
    /// once; a repeat submission fails with `CODE_INVALID_OR_USED`.
    pub async fn submit_host_signature(
        &self,
        submission: HostSignatureSubmission,
    ) -> Result<CourtCard> {
        if submission.host_name.trim().is_empty() {
            return Err(ProofMeetError::invalid_input("hostName", "must not be empty"));
        }
        if submission.signature_data.trim().is_empty() {
            return Err(ProofMeetError::invalid_input(
                "signatureData",
                "must not be empty",
            ));
        }

        // Validate the binding before consuming, so a mismatched record id
        // does not burn the code
        let request = self
            .host_codes
            .peek(&submission.verification_code)
            .await
            .ok_or(ProofMeetError::CodeInvalidOrUsed)?;
        if request.attendance_record_id != submission.attendance_record_id {
            return Err(ProofMeetError::CodeInvalidOrUsed);
        }

        let card = self
            .store
            .find_card_by_attendance(&submission.attendance_record_id)
            .await?
            .ok_or_else(|| ProofMeetError::CardNotMinted {
                attendance_id: submission.attendance_record_id.to_string(),
            })?;
        if card.has_signature_from(SignerRole::MeetingHost) {
            return Err(ProofMeetError::AlreadySigned {
                role: "MEETING_HOST".to_string(),
            });
        }

        // Atomic consume: of two racing submissions only one gets the code
        if self
            .host_codes
            .consume(&submission.verification_code)
            .await
            .is_none()
        {
            return Err(ProofMeetError::CodeInvalidOrUsed);
        }

        let (signature, public_key) =
            ephemeral_sign(card.card_hash.as_bytes()).map_err(|e| ProofMeetError::Crypto {
                message: e.to_string(),
            })?;

        self.store
            .append_signature(
                &card.id,
                CardSignature {
                    signer_id: format!("host:{}", submission.host_email),
                    signer_name: submission.host_name,
                    signer_email: submission.host_email,
                    signer_role: SignerRole::MeetingHost,
                    timestamp: Utc::now(),
                    signature,
                    public_key,
                    signature_method: SignatureMethod::EmailLink,
                    ip_address: submission.ip_address,
                    user_agent: submission.user_agent,
                },
            )
            .await
    }

    async fn require_card(&self, card_id: &CardId) -> Result<CourtCard> {
        self.store
            .get_card(card_id)
            .await?
            .ok_or_else(|| ProofMeetError::CardNotFound {
                card_id: card_id.to_string(),
            })
    }
}
