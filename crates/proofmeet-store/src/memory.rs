//! In-process attendance store
//!
//! Thread-safe and designed for concurrent access. Each map takes its own
//! `RwLock`; individual mutations hold the write lock for the full
//! read-modify-write, and cross-call sequences go through `record_lock`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use tokio::sync::{Mutex, RwLock};

use proofmeet_types::{
    AttendanceId, AttendanceRecord, AttendanceStatus, CardId, CardSignature, CourtCard, MeetingId,
    ParticipantId, ProofMeetError, Result, TimelineEvent,
};

use crate::{AccessAuditEntry, AttendanceStore};

/// In-memory implementation of [`AttendanceStore`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<AttendanceId, AttendanceRecord>>>,
    cards: Arc<RwLock<HashMap<CardId, CourtCard>>>,
    access_log: Arc<RwLock<Vec<AccessAuditEntry>>>,
    locks: Arc<RwLock<HashMap<AttendanceId, Arc<Mutex<()>>>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored records (test support)
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn create_record(&self, record: AttendanceRecord) -> Result<AttendanceRecord> {
        let mut records = self.records.write().await;
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_record(&self, id: &AttendanceId) -> Result<Option<AttendanceRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_by_participant_meeting(
        &self,
        participant_id: &ParticipantId,
        meeting_id: &MeetingId,
    ) -> Result<Vec<AttendanceRecord>> {
        let records = self.records.read().await;
        let mut matches: Vec<AttendanceRecord> = records
            .values()
            .filter(|r| r.participant_id == *participant_id && r.meeting_id == *meeting_id)
            .cloned()
            .collect();
        matches.sort_by_key(|r| std::cmp::Reverse(r.join_time));
        Ok(matches)
    }

    async fn find_in_progress(
        &self,
        participant_id: &ParticipantId,
        meeting_id: &MeetingId,
    ) -> Result<Option<AttendanceRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| {
                r.participant_id == *participant_id
                    && r.meeting_id == *meeting_id
                    && r.status == AttendanceStatus::InProgress
            })
            .max_by_key(|r| r.join_time)
            .cloned())
    }

    async fn find_completed_on(
        &self,
        participant_id: &ParticipantId,
        meeting_id: &MeetingId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| {
                r.participant_id == *participant_id
                    && r.meeting_id == *meeting_id
                    && r.status == AttendanceStatus::Completed
                    && r.meeting_date == date
            })
            .max_by_key(|r| r.leave_time)
            .cloned())
    }

    async fn finalization_candidates(&self, since: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let records = self.records.read().await;
        let cards = self.cards.read().await;
        let carded: std::collections::HashSet<&AttendanceId> =
            cards.values().map(|c| &c.attendance_id).collect();

        let mut candidates: Vec<AttendanceRecord> = records
            .values()
            .filter(|r| {
                r.status == AttendanceStatus::Completed
                    && r.meeting_date >= since
                    && !carded.contains(&r.id)
            })
            .cloned()
            .collect();
        candidates.sort_by_key(|r| r.join_time);
        Ok(candidates)
    }

    async fn participant_chain(
        &self,
        participant_id: &ParticipantId,
        order_desc: bool,
    ) -> Result<Vec<AttendanceRecord>> {
        let records = self.records.read().await;
        let mut chain: Vec<AttendanceRecord> = records
            .values()
            .filter(|r| {
                r.participant_id == *participant_id && r.status == AttendanceStatus::Finalized
            })
            .cloned()
            .collect();
        // Join time breaks ties between same-day records
        chain.sort_by_key(|r| (r.meeting_date, r.join_time));
        if order_desc {
            chain.reverse();
        }
        Ok(chain)
    }

    async fn update_record(&self, record: AttendanceRecord) -> Result<()> {
        let mut records = self.records.write().await;
        let stored = records
            .get(&record.id)
            .ok_or_else(|| ProofMeetError::RecordNotFound {
                attendance_id: record.id.to_string(),
            })?;
        if stored.status.is_terminal() {
            return Err(ProofMeetError::RecordSealed {
                attendance_id: record.id.to_string(),
            });
        }
        let mut record = record;
        record.updated_at = Utc::now();
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn append_event(&self, id: &AttendanceId, event: TimelineEvent) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| ProofMeetError::RecordNotFound {
                attendance_id: id.to_string(),
            })?;
        if record.status.is_terminal() {
            return Err(ProofMeetError::RecordSealed {
                attendance_id: id.to_string(),
            });
        }
        record.timeline.push(event);
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn record_lock(&self, id: &AttendanceId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.write().await;
        locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn insert_card(&self, card: CourtCard) -> Result<()> {
        let mut cards = self.cards.write().await;
        if cards
            .values()
            .any(|c| c.attendance_id == card.attendance_id)
        {
            return Err(ProofMeetError::internal(format!(
                "card already minted for record {}",
                card.attendance_id
            )));
        }
        cards.insert(card.id.clone(), card);
        Ok(())
    }

    async fn get_card(&self, id: &CardId) -> Result<Option<CourtCard>> {
        Ok(self.cards.read().await.get(id).cloned())
    }

    async fn find_card_by_attendance(&self, id: &AttendanceId) -> Result<Option<CourtCard>> {
        let cards = self.cards.read().await;
        Ok(cards.values().find(|c| c.attendance_id == *id).cloned())
    }

    async fn append_signature(
        &self,
        card_id: &CardId,
        signature: CardSignature,
    ) -> Result<CourtCard> {
        let mut cards = self.cards.write().await;
        let card = cards
            .get_mut(card_id)
            .ok_or_else(|| ProofMeetError::CardNotFound {
                card_id: card_id.to_string(),
            })?;
        card.signatures.push(signature);
        Ok(card.clone())
    }

    async fn cards_minted_in_year(&self, year: i32) -> Result<u32> {
        let cards = self.cards.read().await;
        Ok(cards
            .values()
            .filter(|c| c.generated_at.year() == year)
            .count() as u32)
    }

    async fn record_access(&self, entry: AccessAuditEntry) -> Result<()> {
        self.access_log.write().await.push(entry);
        Ok(())
    }

    async fn list_access(&self, card_id: &CardId) -> Result<Vec<AccessAuditEntry>> {
        let log = self.access_log.read().await;
        Ok(log
            .iter()
            .filter(|e| e.card_id == *card_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proofmeet_types::{CourtRepId, EventSource, EventType, Meeting};

    fn meeting() -> Meeting {
        Meeting {
            id: MeetingId::from_string("mtg_store"),
            name: "Noon Group".to_string(),
            program: "AA".to_string(),
            scheduled_start: Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap(),
            duration_minutes: 60,
            expected_join_email: None,
            meeting_url: None,
        }
    }

    fn open_record() -> AttendanceRecord {
        let m = meeting();
        AttendanceRecord::open(
            ParticipantId::from_string("part_a"),
            CourtRepId::from_string("rep_a"),
            &m,
            m.scheduled_start,
        )
    }

    #[tokio::test]
    async fn test_create_and_find_in_progress() {
        let store = MemoryStore::new();
        let record = store.create_record(open_record()).await.unwrap();

        let found = store
            .find_in_progress(&record.participant_id, &record.meeting_id)
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, record.id);
    }

    #[tokio::test]
    async fn test_find_by_participant_meeting_orders_newest_first() {
        let store = MemoryStore::new();
        let m = meeting();
        for minute in [0, 20, 10] {
            let record = AttendanceRecord::open(
                ParticipantId::from_string("part_a"),
                CourtRepId::from_string("rep_a"),
                &m,
                m.scheduled_start + chrono::Duration::minutes(minute),
            );
            store.create_record(record).await.unwrap();
        }

        let matches = store
            .find_by_participant_meeting(&ParticipantId::from_string("part_a"), &m.id)
            .await
            .unwrap();
        assert_eq!(matches.len(), 3);
        assert!(matches[0].join_time > matches[1].join_time);
        assert!(matches[1].join_time > matches[2].join_time);
    }

    #[tokio::test]
    async fn test_sealed_record_rejects_mutation() {
        let store = MemoryStore::new();
        let mut record = store.create_record(open_record()).await.unwrap();

        record.status = AttendanceStatus::Finalized;
        store.update_record(record.clone()).await.unwrap();

        // Now sealed: both update and append must fail
        let err = store.update_record(record.clone()).await.unwrap_err();
        assert_eq!(err.error_code(), "RECORD_SEALED");

        let event = TimelineEvent::new(EventType::Active, Utc::now(), EventSource::FrontendMonitor);
        let err = store.append_event(&record.id, event).await.unwrap_err();
        assert_eq!(err.error_code(), "RECORD_SEALED");
    }

    #[tokio::test]
    async fn test_finalization_candidates_excludes_carded() {
        let store = MemoryStore::new();
        let mut record = store.create_record(open_record()).await.unwrap();
        record.status = AttendanceStatus::Completed;
        store.update_record(record.clone()).await.unwrap();

        let since = record.meeting_date;
        assert_eq!(store.finalization_candidates(since).await.unwrap().len(), 1);

        // Minting a card removes the record from candidacy
        let card = CourtCard {
            id: CardId::new(),
            attendance_id: record.id.clone(),
            participant_id: record.participant_id.clone(),
            meeting_id: record.meeting_id.clone(),
            card_number: "CC-2025-00001-001".to_string(),
            card_hash: "00".repeat(32),
            verification_url: String::new(),
            qr_code_data: String::new(),
            validation_status: proofmeet_types::ValidationStatus::Passed,
            violations: vec![],
            confidence_level: proofmeet_types::ConfidenceLevel::High,
            signatures: vec![],
            cumulative_hours: 1.0,
            generated_at: Utc::now(),
        };
        store.insert_card(card).await.unwrap();
        assert!(store
            .finalization_candidates(since)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_one_card_per_record() {
        let store = MemoryStore::new();
        let record = store.create_record(open_record()).await.unwrap();

        let card = CourtCard {
            id: CardId::new(),
            attendance_id: record.id.clone(),
            participant_id: record.participant_id.clone(),
            meeting_id: record.meeting_id.clone(),
            card_number: "CC-2025-00002-001".to_string(),
            card_hash: "00".repeat(32),
            verification_url: String::new(),
            qr_code_data: String::new(),
            validation_status: proofmeet_types::ValidationStatus::Passed,
            violations: vec![],
            confidence_level: proofmeet_types::ConfidenceLevel::High,
            signatures: vec![],
            cumulative_hours: 1.0,
            generated_at: Utc::now(),
        };
        store.insert_card(card.clone()).await.unwrap();

        let dup = CourtCard {
            id: CardId::new(),
            ..card
        };
        assert!(store.insert_card(dup).await.is_err());
    }

    #[tokio::test]
    async fn test_chain_ordering() {
        let store = MemoryStore::new();
        let m = meeting();
        for day in [3, 1, 2] {
            let mut record = AttendanceRecord::open(
                ParticipantId::from_string("part_a"),
                CourtRepId::from_string("rep_a"),
                &m,
                Utc.with_ymd_and_hms(2025, 4, day, 12, 0, 0).unwrap(),
            );
            record.meeting_date = NaiveDate::from_ymd_opt(2025, 4, day).unwrap();
            record.status = AttendanceStatus::Finalized;
            // Insert directly: update_record refuses to touch sealed rows
            store.records.write().await.insert(record.id.clone(), record);
        }

        let chain = store
            .participant_chain(&ParticipantId::from_string("part_a"), false)
            .await
            .unwrap();
        let days: Vec<u32> = chain.iter().map(|r| r.meeting_date.day()).collect();
        assert_eq!(days, vec![1, 2, 3]);

        let chain_desc = store
            .participant_chain(&ParticipantId::from_string("part_a"), true)
            .await
            .unwrap();
        assert_eq!(chain_desc.first().unwrap().meeting_date.day(), 3);
    }
}
