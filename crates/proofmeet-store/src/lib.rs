//! ProofMeet Store - Attendance state persistence
//!
//! The store is the only shared mutable resource in the system:
//! - Records are mutated under a per-record lock (atomic read-modify-write)
//! - Timelines are append-only
//! - Sealed records (FINALIZED / REJECTED) reject every mutation except
//!   signature appends on their Court Card
//!
//! # Architecture
//!
//! `AttendanceStore` is the async storage contract; `MemoryStore` is the
//! in-process implementation. Ingestion handlers hold no caches - every
//! decision reads the record fresh under its lock.

pub mod directory;
pub mod hostcode;
pub mod memory;

pub use directory::{MeetingDirectory, ParticipantDirectory};
pub use hostcode::{HostCodeStore, HostSignatureRequest};
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use proofmeet_types::{
    AttendanceId, AttendanceRecord, CardId, CardSignature, CourtCard, MeetingId, ParticipantId,
    Result, TimelineEvent,
};

/// One public-verification access, recorded for the audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessAuditEntry {
    pub card_id: CardId,
    pub accessed_at: DateTime<Utc>,
    /// Whether the caller supplied a `?hash=` parameter
    pub hash_supplied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Durable storage contract for attendance records and Court Cards.
///
/// Every mutation is an atomic read-modify-write; multi-step flows
/// (reconciliation, finalization) serialize through `record_lock`.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Persist a freshly opened record
    async fn create_record(&self, record: AttendanceRecord) -> Result<AttendanceRecord>;

    /// Fetch a record by id
    async fn get_record(&self, id: &AttendanceId) -> Result<Option<AttendanceRecord>>;

    /// All of a participant's records for one meeting, newest first
    async fn find_by_participant_meeting(
        &self,
        participant_id: &ParticipantId,
        meeting_id: &MeetingId,
    ) -> Result<Vec<AttendanceRecord>>;

    /// The participant's IN_PROGRESS record for a meeting, if any
    async fn find_in_progress(
        &self,
        participant_id: &ParticipantId,
        meeting_id: &MeetingId,
    ) -> Result<Option<AttendanceRecord>>;

    /// The participant's most recent provisional COMPLETED record for a
    /// meeting on the given calendar day, if any
    async fn find_completed_on(
        &self,
        participant_id: &ParticipantId,
        meeting_id: &MeetingId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>>;

    /// Records eligible for the sweeper: COMPLETED, no Court Card, meeting
    /// date on or after `since`
    async fn finalization_candidates(&self, since: NaiveDate) -> Result<Vec<AttendanceRecord>>;

    /// The participant's FINALIZED records, ordered by meeting date
    /// (descending when `order_desc`)
    async fn participant_chain(
        &self,
        participant_id: &ParticipantId,
        order_desc: bool,
    ) -> Result<Vec<AttendanceRecord>>;

    /// Replace a record wholesale.
    ///
    /// Rejected with `RecordSealed` once the stored record is FINALIZED or
    /// REJECTED; the write that seals the record is the last one accepted.
    async fn update_record(&self, record: AttendanceRecord) -> Result<()>;

    /// Append one timeline event (append-only; rejected on sealed records)
    async fn append_event(&self, id: &AttendanceId, event: TimelineEvent) -> Result<()>;

    /// Per-record mutation lock. Holders serialize every multi-step
    /// read-modify-write on the record.
    async fn record_lock(&self, id: &AttendanceId) -> Arc<Mutex<()>>;

    // ------------------------------------------------------------------
    // Court Cards
    // ------------------------------------------------------------------

    /// Persist a freshly minted card (at most one per record)
    async fn insert_card(&self, card: CourtCard) -> Result<()>;

    /// Fetch a card by id
    async fn get_card(&self, id: &CardId) -> Result<Option<CourtCard>>;

    /// Fetch the card minted for a record, if any
    async fn find_card_by_attendance(&self, id: &AttendanceId) -> Result<Option<CourtCard>>;

    /// Append a signature to a minted card; card-level fields stay frozen
    async fn append_signature(&self, card_id: &CardId, signature: CardSignature)
        -> Result<CourtCard>;

    /// Number of cards minted in a calendar year (drives the per-year
    /// card-number sequence)
    async fn cards_minted_in_year(&self, year: i32) -> Result<u32>;

    // ------------------------------------------------------------------
    // Verification audit trail
    // ------------------------------------------------------------------

    /// Record one public-verification access
    async fn record_access(&self, entry: AccessAuditEntry) -> Result<()>;

    /// Accesses recorded for a card, in append order
    async fn list_access(&self, card_id: &CardId) -> Result<Vec<AccessAuditEntry>>;
}
