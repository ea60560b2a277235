//! ProofMeet Ledger - blockchain-style sealing of finalized records
//!
//! At finalization each record receives a block: a SHA-256 hash over its
//! canonical projection plus the block hash of the participant's previous
//! finalized record (or the `"0"` sentinel), signed with the process key.
//! Blocks are written once and never rewritten.
//!
//! # Invariants
//!
//! 1. The projection has a fixed field order; any change to a sealed field
//!    changes the hash
//! 2. `previous_hash` links strictly by meeting date within one participant
//! 3. A block's signature verifies against the key that sealed it

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use proofmeet_crypto::{hash_canonical, verify_hex_signature, DetachedSignature, SigningKeypair};
use proofmeet_types::{
    AttendanceRecord, AttendanceStatus, LedgerLink, ProofMeetError, Result, GENESIS_HASH,
};

/// The fixed, ordered field tuple hashed into a block.
///
/// Field order is load-bearing: it is the canonical projection. Do not
/// reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockProjection {
    pub record_id: String,
    pub participant_id: String,
    pub meeting_id: String,
    pub meeting_date: NaiveDate,
    pub join_time: DateTime<Utc>,
    pub leave_time: Option<DateTime<Utc>>,
    pub total_duration_min: i64,
    pub attendance_percent: f64,
    pub status: AttendanceStatus,
    pub previous_hash: String,
}

impl BlockProjection {
    /// Project a record against a given previous hash
    pub fn from_record(record: &AttendanceRecord, previous_hash: &str) -> Self {
        Self {
            record_id: record.id.to_string(),
            participant_id: record.participant_id.to_string(),
            meeting_id: record.meeting_id.to_string(),
            meeting_date: record.meeting_date,
            join_time: record.join_time,
            leave_time: record.leave_time,
            total_duration_min: record.total_duration_min,
            attendance_percent: record.attendance_percent,
            status: record.status,
            previous_hash: previous_hash.to_string(),
        }
    }
}

/// Result of verifying a participant's whole chain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainVerification {
    pub is_valid: bool,
    pub total_blocks: usize,
    pub invalid_blocks: usize,
    pub errors: Vec<String>,
}

/// Build and sign the block for a record being finalized.
///
/// `previous_hash` must be the block hash of the participant's immediately
/// prior finalized record, or [`GENESIS_HASH`] for the first.
pub fn build_block(
    record: &AttendanceRecord,
    previous_hash: &str,
    keypair: &SigningKeypair,
) -> Result<LedgerLink> {
    let projection = BlockProjection::from_record(record, previous_hash);
    let block_hash = hash_canonical(&projection).map_err(|e| ProofMeetError::Crypto {
        message: e.to_string(),
    })?;

    let signature =
        DetachedSignature::sign(keypair, block_hash.as_bytes()).map_err(|e| {
            ProofMeetError::Crypto {
                message: e.to_string(),
            }
        })?;

    Ok(LedgerLink {
        previous_hash: previous_hash.to_string(),
        block_hash,
        block_signature: signature.signature,
        signer_public_key: signature.public_key,
    })
}

/// Pick the previous hash for a participant's next block.
///
/// `chain` is the participant's finalized records in descending date order;
/// the first entry carrying a block supplies the hash.
pub fn previous_hash_of(chain: &[AttendanceRecord]) -> String {
    chain
        .iter()
        .find_map(|r| r.metadata.block.as_ref().map(|b| b.block_hash.clone()))
        .unwrap_or_else(|| GENESIS_HASH.to_string())
}

/// Verify a participant's chain, in chronological order.
///
/// Each block hash is recomputed from the live record, its signature is
/// checked against the recorded signer key, and linkage is compared to the
/// prior block. Any mismatch is a tampering signal.
pub fn verify_chain(records: &[AttendanceRecord]) -> ChainVerification {
    let mut errors = Vec::new();
    let mut invalid_blocks = 0usize;
    let mut expected_previous = GENESIS_HASH.to_string();

    for record in records {
        let Some(block) = record.metadata.block.as_ref() else {
            invalid_blocks += 1;
            errors.push(format!("record {} carries no ledger block", record.id));
            continue;
        };

        let mut block_ok = true;

        let projection = BlockProjection::from_record(record, &block.previous_hash);
        match hash_canonical(&projection) {
            Ok(recomputed) if recomputed == block.block_hash => {}
            Ok(_) => {
                block_ok = false;
                errors.push(format!(
                    "record {}: stored block hash does not match the live record",
                    record.id
                ));
            }
            Err(e) => {
                block_ok = false;
                errors.push(format!("record {}: {e}", record.id));
            }
        }

        match verify_hex_signature(
            &block.block_signature,
            &block.signer_public_key,
            block.block_hash.as_bytes(),
        ) {
            Ok(true) => {}
            Ok(false) => {
                block_ok = false;
                errors.push(format!(
                    "record {}: block signature does not verify",
                    record.id
                ));
            }
            Err(e) => {
                block_ok = false;
                errors.push(format!("record {}: malformed signature ({e})", record.id));
            }
        }

        if block.previous_hash != expected_previous {
            block_ok = false;
            errors.push(format!(
                "record {}: previous hash {} does not match prior block {}",
                record.id, block.previous_hash, expected_previous
            ));
        }

        if !block_ok {
            invalid_blocks += 1;
        }
        expected_previous = block.block_hash.clone();
    }

    ChainVerification {
        is_valid: invalid_blocks == 0,
        total_blocks: records.len(),
        invalid_blocks,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proofmeet_types::{CourtRepId, Meeting, MeetingId, ParticipantId};

    fn finalized_record(day: u32, start_hour: u32) -> AttendanceRecord {
        let meeting = Meeting {
            id: MeetingId::from_string("mtg_chain"),
            name: "Daily Reflection".to_string(),
            program: "AA".to_string(),
            scheduled_start: Utc.with_ymd_and_hms(2025, 6, day, start_hour, 0, 0).unwrap(),
            duration_minutes: 60,
            expected_join_email: None,
            meeting_url: None,
        };
        let mut record = AttendanceRecord::open(
            ParticipantId::from_string("part_chain"),
            CourtRepId::from_string("rep_chain"),
            &meeting,
            meeting.scheduled_start,
        );
        record.leave_time = Some(meeting.scheduled_start + Duration::minutes(60));
        record.total_duration_min = 60;
        record.attendance_percent = 100.0;
        record.status = AttendanceStatus::Finalized;
        record
    }

    fn seal(records: &mut [AttendanceRecord], keypair: &SigningKeypair) {
        let mut previous = GENESIS_HASH.to_string();
        for record in records.iter_mut() {
            let block = build_block(record, &previous, keypair).unwrap();
            previous = block.block_hash.clone();
            record.metadata.block = Some(block);
        }
    }

    #[test]
    fn test_first_block_links_to_genesis() {
        let keypair = SigningKeypair::generate();
        let record = finalized_record(1, 10);
        let block = build_block(&record, GENESIS_HASH, &keypair).unwrap();

        assert_eq!(block.previous_hash, GENESIS_HASH);
        assert_eq!(block.block_hash.len(), 64);
    }

    #[test]
    fn test_chain_rebuild_reproduces_hashes() {
        let keypair = SigningKeypair::generate();
        let mut records = vec![
            finalized_record(1, 10),
            finalized_record(2, 10),
            finalized_record(3, 10),
        ];
        seal(&mut records, &keypair);

        // Recomputing every block from scratch reproduces stored hashes
        let mut previous = GENESIS_HASH.to_string();
        for record in &records {
            let block = record.metadata.block.as_ref().unwrap();
            let projection = BlockProjection::from_record(record, &previous);
            assert_eq!(hash_canonical(&projection).unwrap(), block.block_hash);
            previous = block.block_hash.clone();
        }

        let verification = verify_chain(&records);
        assert!(verification.is_valid);
        assert_eq!(verification.total_blocks, 3);
        assert_eq!(verification.invalid_blocks, 0);
    }

    #[test]
    fn test_tampered_record_breaks_chain() {
        let keypair = SigningKeypair::generate();
        let mut records = vec![finalized_record(1, 10), finalized_record(2, 10)];
        seal(&mut records, &keypair);

        // Quietly inflate the first record's duration
        records[0].total_duration_min = 90;

        let verification = verify_chain(&records);
        assert!(!verification.is_valid);
        assert_eq!(verification.invalid_blocks, 1);
        assert!(verification
            .errors
            .iter()
            .any(|e| e.contains("does not match the live record")));
    }

    #[test]
    fn test_broken_linkage_detected() {
        let keypair = SigningKeypair::generate();
        let mut records = vec![finalized_record(1, 10), finalized_record(2, 10)];
        seal(&mut records, &keypair);

        // Re-seal the second block against a forged predecessor
        let forged = build_block(&records[1], "ff".repeat(32).as_str(), &keypair).unwrap();
        records[1].metadata.block = Some(forged);

        let verification = verify_chain(&records);
        assert!(!verification.is_valid);
        assert!(verification
            .errors
            .iter()
            .any(|e| e.contains("previous hash")));
    }

    #[test]
    fn test_previous_hash_of_descending_chain() {
        let keypair = SigningKeypair::generate();
        let mut records = vec![finalized_record(1, 10), finalized_record(2, 10)];
        seal(&mut records, &keypair);
        let latest_hash = records[1]
            .metadata
            .block
            .as_ref()
            .unwrap()
            .block_hash
            .clone();

        // Descending order: newest first
        records.reverse();
        assert_eq!(previous_hash_of(&records), latest_hash);
        assert_eq!(previous_hash_of(&[]), GENESIS_HASH);
    }
}
