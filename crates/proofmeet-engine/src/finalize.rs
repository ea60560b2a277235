//! The finalization pipeline
//!
//! Runs once per record, after the scheduled window closes: engagement
//! scoring, fraud evaluation, outcome gating, ledger sealing, and card
//! minting. Every step is idempotent - a step that already wrote its
//! output is not re-run - so a failed pipeline can be retried by the next
//! sweeper pass.
//!
//! Outcome precedence: reject > flag-for-review > pass/fail.

use chrono::{DateTime, Datelike, Utc};

use proofmeet_ledger::{build_block, previous_hash_of};
use proofmeet_store::AttendanceStore;
use proofmeet_types::{
    AttendanceId, AttendanceStatus, CourtCard, EngagementLevel, FraudRecommendation, Meeting,
    ProofMeetError, Result, ValidationStatus, Violation,
};

use crate::AttendanceEngine;

/// Stamp recorded when the sweeper finalizes a record
pub const AUTO_FINALIZATION: &str = "AUTO_FINALIZATION";

/// Result of one finalization
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub attendance_id: AttendanceId,
    pub status: AttendanceStatus,
    pub validation_status: Option<ValidationStatus>,
    pub card: Option<CourtCard>,
}

impl AttendanceEngine {
    /// Finalize a record, taking its lock
    pub async fn finalize_record(
        &self,
        attendance_id: &AttendanceId,
        finalized_by: &str,
        now: DateTime<Utc>,
    ) -> Result<FinalizeOutcome> {
        let record = self.store.get_record(attendance_id).await?.ok_or_else(|| {
            ProofMeetError::RecordNotFound {
                attendance_id: attendance_id.to_string(),
            }
        })?;
        let meeting = self.meetings.get(&record.meeting_id).await.ok_or_else(|| {
            ProofMeetError::MeetingNotFound {
                meeting_id: record.meeting_id.to_string(),
            }
        })?;

        let lock = self.store.record_lock(attendance_id).await;
        let _guard = lock.lock().await;
        self.finalize_locked(attendance_id, &meeting, finalized_by, now)
            .await
    }

    /// Finalization body. Caller must hold the record lock.
    pub(crate) async fn finalize_locked(
        &self,
        attendance_id: &AttendanceId,
        meeting: &Meeting,
        finalized_by: &str,
        now: DateTime<Utc>,
    ) -> Result<FinalizeOutcome> {
        let mut record = self.store.get_record(attendance_id).await?.ok_or_else(|| {
            ProofMeetError::RecordNotFound {
                attendance_id: attendance_id.to_string(),
            }
        })?;

        // Re-running against a sealed record is a no-op
        if record.status.is_terminal() {
            let card = self.store.find_card_by_attendance(attendance_id).await?;
            return Ok(FinalizeOutcome {
                attendance_id: record.id,
                status: record.status,
                validation_status: card.as_ref().map(|c| c.validation_status),
                card,
            });
        }
        if record.status != AttendanceStatus::Completed {
            return Err(ProofMeetError::internal(format!(
                "record {} is not in a finalizable state",
                record.id
            )));
        }

        // Step 1: engagement scoring
        if record.metadata.engagement.is_none() {
            record.metadata.engagement = Some(proofmeet_engagement::analyze(
                &record.timeline,
                meeting.duration_minutes,
            ));
        }
        let engagement = record
            .metadata
            .engagement
            .clone()
            .ok_or_else(|| ProofMeetError::internal("engagement analysis missing"))?;

        // Step 2: fraud evaluation
        if record.metadata.fraud.is_none() {
            record.metadata.fraud = Some(proofmeet_fraud::evaluate(&record, meeting, &engagement));
        }
        let fraud = record
            .metadata
            .fraud
            .clone()
            .ok_or_else(|| ProofMeetError::internal("fraud analysis missing"))?;

        // Step 3: outcome gating
        let auto_reject = fraud.risk_score >= 80
            || fraud.recommendation == FraudRecommendation::Reject
            || engagement.level == EngagementLevel::Suspicious;

        let mut validation_status = None;
        let mut card_violations: Vec<Violation> = Vec::new();

        if auto_reject {
            record.status = AttendanceStatus::Rejected;
            record.is_valid = Some(false);
            record.metadata.rejection_reason = Some(rejection_reason(&fraud.violations, &engagement.flags));
        } else {
            record.status = AttendanceStatus::Finalized;
            let threshold_violations = proofmeet_fraud::threshold_check(&record, meeting);
            let flagged = (40..80).contains(&fraud.risk_score)
                || engagement.level == EngagementLevel::Low;

            card_violations = fraud.violations.clone();
            card_violations.extend(threshold_violations.iter().cloned());

            let status = if flagged {
                record.metadata.extra.insert(
                    "flaggedForReview".to_string(),
                    serde_json::json!({
                        "fraudRiskScore": fraud.risk_score,
                        "engagementLevel": engagement.level,
                    }),
                );
                ValidationStatus::FlaggedForReview
            } else if threshold_violations.is_empty() {
                ValidationStatus::Passed
            } else {
                ValidationStatus::Failed
            };
            record.is_valid = Some(status != ValidationStatus::Failed);
            validation_status = Some(status);
        }

        // Step 4: ledger block, sealed over the record's final status
        if record.metadata.block.is_none() {
            let chain_desc = self
                .store
                .participant_chain(&record.participant_id, true)
                .await?;
            let previous_hash = previous_hash_of(&chain_desc);
            record.metadata.block =
                Some(build_block(&record, &previous_hash, &self.signing_key)?);
        }

        // Cumulative hours across the chain, this record included
        let chain_minutes: i64 = self
            .store
            .participant_chain(&record.participant_id, false)
            .await?
            .iter()
            .map(|r| r.total_duration_min)
            .sum();
        let cumulative_hours =
            (chain_minutes + record.total_duration_min) as f64 / 60.0;

        // Step 5: stamps, then seal. This update is the last write the
        // store accepts for the record.
        record.metadata.finalized_at = Some(now);
        record.metadata.finalized_by = Some(finalized_by.to_string());
        self.store.update_record(record.clone()).await?;

        // Step 6: card mint, unless rejected
        let card = match validation_status {
            Some(status) => {
                match self.store.find_card_by_attendance(&record.id).await? {
                    Some(existing) => Some(existing),
                    None => {
                        let sequence = self.store.cards_minted_in_year(now.year()).await? + 1;
                        let card = self.minter.mint(
                            &record,
                            status,
                            card_violations,
                            cumulative_hours,
                            sequence,
                        )?;
                        self.store.insert_card(card.clone()).await?;
                        Some(card)
                    }
                }
            }
            None => None,
        };

        tracing::info!(
            attendance = %record.id,
            status = ?record.status,
            validation = ?validation_status,
            finalized_by,
            "attendance record finalized"
        );

        self.notifications
            .digest_queued(&record.court_rep_id, &record, card.as_ref())
            .await;

        Ok(FinalizeOutcome {
            attendance_id: record.id,
            status: record.status,
            validation_status,
            card,
        })
    }
}

/// Compose a human-readable rejection reason from what triggered it
fn rejection_reason(
    violations: &[Violation],
    flags: &[proofmeet_types::EngagementFlag],
) -> String {
    let mut parts: Vec<String> = violations
        .iter()
        .filter(|v| v.severity == proofmeet_types::ViolationSeverity::Critical)
        .map(|v| v.message.clone())
        .collect();
    if parts.is_empty() {
        parts = violations.iter().map(|v| v.message.clone()).collect();
    }
    if parts.is_empty() {
        parts = flags.iter().map(|f| format!("{f:?}")).collect();
    }
    parts.join("; ")
}
