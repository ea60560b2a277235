//! ProofMeet Engine - the attendance lifecycle core
//!
//! The engine reconciles three concurrent event streams - provider
//! webhooks, participant-side activity heartbeats, and explicit
//! join/leave requests - into one authoritative attendance record per
//! (participant, meeting, day). When the scheduled meeting window closes,
//! the finalization pipeline scores engagement, runs fraud rules, seals the
//! record into the participant's hash chain, and mints a Court Card unless
//! the record was auto-rejected.
//!
//! # Concurrency
//!
//! Every multi-step read-modify-write serializes through the store's
//! per-record lock. Handlers hold no caches: each decision re-reads the
//! record under its lock. The signing key is a process-wide immutable
//! resource.

pub mod cardops;
pub mod finalize;
pub mod notify;
pub mod reconcile;
pub mod sweeper;
pub mod webhook;

pub use cardops::*;
pub use finalize::*;
pub use notify::*;
pub use reconcile::*;
pub use sweeper::*;
pub use webhook::*;

use std::sync::Arc;

use proofmeet_cards::CardMinter;
use proofmeet_crypto::SigningKeypair;
use proofmeet_store::{AttendanceStore, HostCodeStore, MeetingDirectory, ParticipantDirectory};

/// Engine tunables
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the public verification frontend
    pub frontend_base: String,
    /// How far back the sweeper looks for finalization candidates, in hours
    pub candidate_window_hours: i64,
    /// Minutes of monitor silence before a re-join counts as a dropped
    /// session
    pub stale_after_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frontend_base: "http://localhost:3000".to_string(),
            candidate_window_hours: 24,
            stale_after_minutes: 1,
        }
    }
}

/// The attendance lifecycle engine
#[derive(Clone)]
pub struct AttendanceEngine {
    pub(crate) store: Arc<dyn AttendanceStore>,
    pub(crate) meetings: MeetingDirectory,
    pub(crate) participants: ParticipantDirectory,
    pub(crate) host_codes: HostCodeStore,
    pub(crate) minter: CardMinter,
    pub(crate) signing_key: Arc<SigningKeypair>,
    pub(crate) notifications: Arc<dyn NotificationSink>,
    pub(crate) config: EngineConfig,
}

impl AttendanceEngine {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        meetings: MeetingDirectory,
        participants: ParticipantDirectory,
        host_codes: HostCodeStore,
        signing_key: Arc<SigningKeypair>,
        notifications: Arc<dyn NotificationSink>,
        config: EngineConfig,
    ) -> Self {
        let minter = CardMinter::new(config.frontend_base.clone());
        Self {
            store,
            meetings,
            participants,
            host_codes,
            minter,
            signing_key,
            notifications,
            config,
        }
    }

    /// The store behind this engine (handlers use it for read paths)
    pub fn store(&self) -> &Arc<dyn AttendanceStore> {
        &self.store
    }

    /// The meeting directory
    pub fn meetings(&self) -> &MeetingDirectory {
        &self.meetings
    }

    /// The participant directory
    pub fn participants(&self) -> &ParticipantDirectory {
        &self.participants
    }
}
