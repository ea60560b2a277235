//! The finalization sweeper
//!
//! A single supervised timer task guarantees finalization even when the
//! participant never signals departure: every pass enumerates provisional
//! records whose window has closed and runs the pipeline on each. Failures
//! are logged and retried on the next tick; the sweeper itself never dies.

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;

use proofmeet_store::AttendanceStore;

use crate::{AttendanceEngine, AUTO_FINALIZATION};

/// Counters from one sweep pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub examined: usize,
    pub finalized: usize,
    pub rejected: usize,
    /// Window still open (rejoinable), left for a later pass
    pub skipped: usize,
    pub failed: usize,
}

impl AttendanceEngine {
    /// Run one sweep pass at an explicit instant
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepStats {
        let since = (now - Duration::hours(self.config.candidate_window_hours)).date_naive();
        let candidates = match self.store.finalization_candidates(since).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(error = %e, "sweep pass could not list candidates");
                return SweepStats::default();
            }
        };

        let mut stats = SweepStats {
            examined: candidates.len(),
            ..Default::default()
        };

        for candidate in candidates {
            let Some(meeting) = self.meetings.get(&candidate.meeting_id).await else {
                stats.failed += 1;
                tracing::warn!(
                    attendance = %candidate.id,
                    meeting = %candidate.meeting_id,
                    "candidate references an unknown meeting"
                );
                continue;
            };

            // Still rejoinable until the participant's own window closes
            let meeting_end = candidate.join_time + Duration::minutes(meeting.duration_minutes);
            if now <= meeting_end {
                stats.skipped += 1;
                continue;
            }

            let lock = self.store.record_lock(&candidate.id).await;
            let _guard = lock.lock().await;
            match self
                .finalize_locked(&candidate.id, &meeting, AUTO_FINALIZATION, now)
                .await
            {
                Ok(outcome) => match outcome.status {
                    proofmeet_types::AttendanceStatus::Rejected => stats.rejected += 1,
                    _ => stats.finalized += 1,
                },
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(
                        attendance = %candidate.id,
                        error = %e,
                        "finalization failed; will retry next pass"
                    );
                }
            }
        }

        if stats.examined > 0 {
            tracing::info!(
                examined = stats.examined,
                finalized = stats.finalized,
                rejected = stats.rejected,
                skipped = stats.skipped,
                failed = stats.failed,
                "sweep pass complete"
            );
        }

        stats
    }

    /// Run one sweep pass now
    pub async fn sweep(&self) -> SweepStats {
        self.sweep_at(Utc::now()).await
    }
}

/// Periodic driver for [`AttendanceEngine::sweep`]
pub struct FinalizationSweeper {
    engine: AttendanceEngine,
    interval: std::time::Duration,
}

impl FinalizationSweeper {
    pub fn new(engine: AttendanceEngine, interval: std::time::Duration) -> Self {
        Self { engine, interval }
    }

    /// Spawn the sweeper task. The first tick fires immediately, so a
    /// restart finalizes overdue records without waiting a full interval.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                self.engine.sweep().await;
            }
        })
    }
}
