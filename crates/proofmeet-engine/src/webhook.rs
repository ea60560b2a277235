//! Webhook ingestion
//!
//! The video provider pushes join/leave notifications keyed by participant
//! email. Webhooks only ever annotate records the participant opened
//! through the join-meeting API - an unmatched email or a missing record
//! drops the event with a warning, never a phantom record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use proofmeet_store::AttendanceStore;
use proofmeet_types::{
    EventSource, EventType, MeetingId, Result, TimelineEvent,
};

use crate::AttendanceEngine;

/// Parsed webhook notification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WebhookEvent {
    #[serde(rename = "meeting.participant_joined")]
    ParticipantJoined {
        #[serde(rename = "meetingId")]
        meeting_id: MeetingId,
        email: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "meeting.participant_left")]
    ParticipantLeft {
        #[serde(rename = "meetingId")]
        meeting_id: MeetingId,
        email: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "meeting.started")]
    MeetingStarted {
        #[serde(rename = "meetingId")]
        meeting_id: MeetingId,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "meeting.ended")]
    MeetingEnded {
        #[serde(rename = "meetingId")]
        meeting_id: MeetingId,
        timestamp: DateTime<Utc>,
    },
}

/// What ingestion did with a webhook event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookDisposition {
    /// Event was applied to an attendance record
    Applied,
    /// Event was acknowledged but carried no record-level effect
    Acknowledged,
    /// Event was dropped (no matching participant or record)
    Dropped,
}

impl AttendanceEngine {
    /// Ingest a verified webhook event at the current time
    pub async fn ingest_webhook(&self, event: WebhookEvent) -> Result<WebhookDisposition> {
        self.ingest_webhook_at(event, Utc::now()).await
    }

    /// Ingest a verified webhook event at an explicit instant
    pub async fn ingest_webhook_at(
        &self,
        event: WebhookEvent,
        now: DateTime<Utc>,
    ) -> Result<WebhookDisposition> {
        match event {
            WebhookEvent::ParticipantJoined {
                meeting_id,
                email,
                timestamp,
            } => self.webhook_joined(&meeting_id, &email, timestamp).await,
            WebhookEvent::ParticipantLeft {
                meeting_id,
                email,
                timestamp,
            } => self.webhook_left(&meeting_id, &email, timestamp, now).await,
            WebhookEvent::MeetingStarted {
                meeting_id,
                timestamp,
            } => {
                tracing::info!(meeting = %meeting_id, %timestamp, "provider reports meeting started");
                Ok(WebhookDisposition::Acknowledged)
            }
            WebhookEvent::MeetingEnded {
                meeting_id,
                timestamp,
            } => {
                tracing::info!(meeting = %meeting_id, %timestamp, "provider reports meeting ended");
                Ok(WebhookDisposition::Acknowledged)
            }
        }
    }

    /// Provider-reported join: corroborate an open record.
    ///
    /// The webhook timestamp becomes the authoritative join time when it
    /// precedes the one the API recorded.
    async fn webhook_joined(
        &self,
        meeting_id: &MeetingId,
        email: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<WebhookDisposition> {
        let Some(participant) = self.participants.find_by_email(email).await else {
            tracing::warn!(meeting = %meeting_id, email, "webhook join for unknown email dropped");
            return Ok(WebhookDisposition::Dropped);
        };

        let Some(existing) = self
            .store
            .find_in_progress(&participant.id, meeting_id)
            .await?
        else {
            tracing::warn!(
                meeting = %meeting_id,
                participant = %participant.id,
                "webhook join without an open record dropped"
            );
            return Ok(WebhookDisposition::Dropped);
        };

        let lock = self.store.record_lock(&existing.id).await;
        let _guard = lock.lock().await;
        let Some(mut record) = self.store.get_record(&existing.id).await? else {
            return Ok(WebhookDisposition::Dropped);
        };
        if record.status != proofmeet_types::AttendanceStatus::InProgress {
            return Ok(WebhookDisposition::Dropped);
        }

        record.timeline.push(TimelineEvent::new(
            EventType::Joined,
            timestamp,
            EventSource::Webhook,
        ));
        if timestamp < record.join_time {
            record.join_time = timestamp;
        }
        record.verification_method = record.derive_verification_method();
        self.store.update_record(record).await?;

        Ok(WebhookDisposition::Applied)
    }

    /// Provider-reported leave: append the event and run the same leave
    /// reconciliation the participant API uses.
    async fn webhook_left(
        &self,
        meeting_id: &MeetingId,
        email: &str,
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<WebhookDisposition> {
        let Some(participant) = self.participants.find_by_email(email).await else {
            tracing::warn!(meeting = %meeting_id, email, "webhook leave for unknown email dropped");
            return Ok(WebhookDisposition::Dropped);
        };

        let Some(existing) = self
            .store
            .find_in_progress(&participant.id, meeting_id)
            .await?
        else {
            // Either never tracked or the user's own leave won the race
            tracing::warn!(
                meeting = %meeting_id,
                participant = %participant.id,
                "webhook leave without an open record dropped"
            );
            return Ok(WebhookDisposition::Dropped);
        };

        let lock = self.store.record_lock(&existing.id).await;
        let _guard = lock.lock().await;
        let Some(record) = self.store.get_record(&existing.id).await? else {
            return Ok(WebhookDisposition::Dropped);
        };

        match self
            .apply_leave(record, timestamp, EventSource::Webhook, now)
            .await
        {
            Ok(_) => Ok(WebhookDisposition::Applied),
            // The user's own leave landed first; this one is a no-op
            Err(proofmeet_types::ProofMeetError::NotInProgress { .. }) => {
                Ok(WebhookDisposition::Dropped)
            }
            Err(e) => Err(e),
        }
    }
}
