//! Meeting and participant directories
//!
//! Both are read-only to the attendance engine: meetings are synced from
//! external directories and participants are registered elsewhere. The
//! engine only looks things up.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use proofmeet_types::{Meeting, MeetingId, Participant, ParticipantId};

/// Registry of scheduled meetings
#[derive(Clone, Default)]
pub struct MeetingDirectory {
    meetings: Arc<RwLock<HashMap<MeetingId, Meeting>>>,
}

impl MeetingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a meeting
    pub async fn upsert(&self, meeting: Meeting) {
        self.meetings
            .write()
            .await
            .insert(meeting.id.clone(), meeting);
    }

    /// Look up a meeting by id
    pub async fn get(&self, id: &MeetingId) -> Option<Meeting> {
        self.meetings.read().await.get(id).cloned()
    }

    /// Number of registered meetings
    pub async fn len(&self) -> usize {
        self.meetings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.meetings.read().await.is_empty()
    }
}

/// Registry of participant accounts
#[derive(Clone, Default)]
pub struct ParticipantDirectory {
    participants: Arc<RwLock<HashMap<ParticipantId, Participant>>>,
}

impl ParticipantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a participant
    pub async fn upsert(&self, participant: Participant) {
        self.participants
            .write()
            .await
            .insert(participant.id.clone(), participant);
    }

    /// Look up a participant by id
    pub async fn get(&self, id: &ParticipantId) -> Option<Participant> {
        self.participants.read().await.get(id).cloned()
    }

    /// Match a participant by join email, case-insensitively.
    ///
    /// This is the only identity proof the webhook path has; an unmatched
    /// email means the event is dropped.
    pub async fn find_by_email(&self, email: &str) -> Option<Participant> {
        let wanted = email.trim().to_ascii_lowercase();
        let participants = self.participants.read().await;
        participants
            .values()
            .find(|p| p.email.to_ascii_lowercase() == wanted)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.participants.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(email: &str) -> Participant {
        Participant {
            id: ParticipantId::new(),
            email: email.to_string(),
            display_name: "Test".to_string(),
            court_rep_id: None,
            password_hash: String::new(),
        }
    }

    #[tokio::test]
    async fn test_email_match_is_case_insensitive() {
        let dir = ParticipantDirectory::new();
        dir.upsert(participant("Someone@Example.COM")).await;

        assert!(dir.find_by_email("someone@example.com").await.is_some());
        assert!(dir.find_by_email(" SOMEONE@example.com ").await.is_some());
        assert!(dir.find_by_email("other@example.com").await.is_none());
    }
}
