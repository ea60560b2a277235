//! Court-rep notification sink
//!
//! Finalization enqueues a digest notification to the record's court
//! representative. Delivery (email, dashboards) lives outside the core;
//! the engine only hands the outcome to a sink.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use proofmeet_types::{AttendanceRecord, CourtCard, CourtRepId};

/// Receives finalization outcomes for downstream digest delivery
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// A record finished finalization; `card` is None when auto-rejected
    async fn digest_queued(
        &self,
        court_rep_id: &CourtRepId,
        record: &AttendanceRecord,
        card: Option<&CourtCard>,
    );
}

/// Default sink: structured log lines only
#[derive(Debug, Default, Clone)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn digest_queued(
        &self,
        court_rep_id: &CourtRepId,
        record: &AttendanceRecord,
        card: Option<&CourtCard>,
    ) {
        tracing::info!(
            court_rep = %court_rep_id,
            record = %record.id,
            status = ?record.status,
            card = ?card.map(|c| c.card_number.as_str()),
            "finalization digest queued"
        );
    }
}

/// Sink that records every digest, for assertions in tests
#[derive(Default, Clone)]
pub struct RecordingSink {
    digests: Arc<Mutex<Vec<(CourtRepId, String, Option<String>)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// (court rep, record id, card number) triples seen so far
    pub async fn digests(&self) -> Vec<(CourtRepId, String, Option<String>)> {
        self.digests.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn digest_queued(
        &self,
        court_rep_id: &CourtRepId,
        record: &AttendanceRecord,
        card: Option<&CourtCard>,
    ) {
        self.digests.lock().await.push((
            court_rep_id.clone(),
            record.id.to_string(),
            card.map(|c| c.card_number.clone()),
        ));
    }
}
