//! Reconciliation of join, leave, and heartbeat streams
//!
//! Explicit `join-meeting` / `leave-meeting` calls are the only ones that
//! create or close records; webhooks and heartbeats annotate them. Every
//! path here re-reads the record under its per-record lock before deciding
//! anything.

use chrono::{DateTime, Duration, Utc};

use proofmeet_store::AttendanceStore;
use proofmeet_types::{
    AbsenceDetection, AbsencePeriod, AttendanceId, AttendanceRecord, AttendanceStatus, EventSource,
    EventType, Meeting, ParticipantId, ProofMeetError, Result, TimelineEvent,
    HEARTBEAT_INTERVAL_SECS,
};

use crate::AttendanceEngine;

/// Result of a join-meeting call
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub attendance_id: AttendanceId,
    pub join_time: DateTime<Utc>,
    pub tracking_active: bool,
    pub meeting_url: Option<String>,
    /// The call re-attached to an existing episode
    pub rejoin_detected: bool,
    /// Minutes away, when a rejoin closed an absence gap
    pub absence_minutes: Option<i64>,
}

/// Result of a leave-meeting call or webhook leave
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    pub attendance_id: AttendanceId,
    /// Wall-clock minutes from first join to this leave
    pub duration_min: i64,
    /// Net minutes after subtracting absences
    pub total_duration_min: i64,
    pub absence_minutes: i64,
    pub attendance_percent: f64,
    pub status: AttendanceStatus,
    pub court_card_generated: bool,
    /// The window is still open; the participant may return
    pub can_rejoin: bool,
    /// Minutes until the scheduled window closes (zero once closed)
    pub minutes_until_close: i64,
}

/// Result of an accepted heartbeat
#[derive(Debug, Clone)]
pub struct HeartbeatOutcome {
    pub attendance_id: AttendanceId,
    pub active_duration_min: i64,
    pub idle_duration_min: i64,
    pub timeline_events: usize,
}

impl AttendanceEngine {
    // ======================================================================
    // Join
    // ======================================================================

    /// Handle a join-meeting request at the current time
    pub async fn join_meeting(
        &self,
        participant_id: &ParticipantId,
        meeting_id: &proofmeet_types::MeetingId,
    ) -> Result<JoinOutcome> {
        self.join_meeting_at(participant_id, meeting_id, Utc::now())
            .await
    }

    /// Handle a join-meeting request at an explicit instant
    pub async fn join_meeting_at(
        &self,
        participant_id: &ParticipantId,
        meeting_id: &proofmeet_types::MeetingId,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome> {
        let participant = self.participants.get(participant_id).await.ok_or_else(|| {
            ProofMeetError::ParticipantNotFound {
                participant_id: participant_id.to_string(),
            }
        })?;
        let court_rep =
            participant
                .court_rep_id
                .clone()
                .ok_or_else(|| ProofMeetError::NoCourtRep {
                    participant_id: participant_id.to_string(),
                })?;
        let meeting =
            self.meetings
                .get(meeting_id)
                .await
                .ok_or_else(|| ProofMeetError::MeetingNotFound {
                    meeting_id: meeting_id.to_string(),
                })?;

        // An open record means either a stale session or a duplicate join
        if let Some(existing) = self.store.find_in_progress(participant_id, meeting_id).await? {
            let lock = self.store.record_lock(&existing.id).await;
            let _guard = lock.lock().await;
            if let Some(record) = self.store.get_record(&existing.id).await? {
                if record.status == AttendanceStatus::InProgress {
                    return self.rejoin_stale(record, &meeting, now).await;
                }
            }
            // Status moved while we waited for the lock; fall through to
            // the completed-record path below.
        }

        // A provisional COMPLETED record from today can be reopened while
        // the window is still open
        if let Some(completed) = self
            .store
            .find_completed_on(participant_id, meeting_id, now.date_naive())
            .await?
        {
            if meeting.window_closed(now) {
                return Err(ProofMeetError::MeetingEnded {
                    minutes_since_close: meeting.minutes_since_close(now),
                });
            }
            let lock = self.store.record_lock(&completed.id).await;
            let _guard = lock.lock().await;
            if let Some(record) = self.store.get_record(&completed.id).await? {
                if record.status == AttendanceStatus::Completed {
                    return self.reopen_completed(record, &meeting, now).await;
                }
            }
        }

        // Fresh episode
        let mut record = AttendanceRecord::open(
            participant_id.clone(),
            court_rep,
            &meeting,
            now,
        );
        record.timeline.push(TimelineEvent::new(
            EventType::Joined,
            now,
            EventSource::System,
        ));
        let record = self.store.create_record(record).await?;

        tracing::info!(
            participant = %participant_id,
            meeting = %meeting_id,
            attendance = %record.id,
            "attendance record opened"
        );

        Ok(JoinOutcome {
            attendance_id: record.id,
            join_time: record.join_time,
            tracking_active: true,
            meeting_url: meeting.meeting_url.clone(),
            rejoin_detected: false,
            absence_minutes: None,
        })
    }

    /// Re-join against an IN_PROGRESS record: either a dropped session or a
    /// duplicate join.
    ///
    /// The session counts as dropped when the monitor has been silent for
    /// at least the stale threshold AND at least two monitor events exist,
    /// so a single missing heartbeat never opens an absence gap.
    async fn rejoin_stale(
        &self,
        mut record: AttendanceRecord,
        meeting: &Meeting,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome> {
        let monitor_count = record.monitor_events().count();
        let last_monitor = record.last_monitor_event().map(|e| e.timestamp);

        if let Some(last) = last_monitor {
            let stale_after = Duration::minutes(self.config.stale_after_minutes);
            if monitor_count >= 2 && now - last >= stale_after {
                // Generous boundary: the absence starts one heartbeat
                // interval after the last observed event
                let leave_moment = last + Duration::seconds(HEARTBEAT_INTERVAL_SECS);
                let period =
                    AbsencePeriod::new(leave_moment, now, AbsenceDetection::StaleInProgress);
                let absence_minutes = period.absence_minutes;

                record.metadata.absence_periods.push(period);
                record.metadata.rejoin_count += 1;
                self.store.update_record(record.clone()).await?;

                tracing::info!(
                    attendance = %record.id,
                    absence_minutes,
                    "stale session re-join detected"
                );

                return Ok(JoinOutcome {
                    attendance_id: record.id,
                    join_time: record.join_time,
                    tracking_active: true,
                    meeting_url: meeting.meeting_url.clone(),
                    rejoin_detected: true,
                    absence_minutes: Some(absence_minutes),
                });
            }
        }

        Err(ProofMeetError::AlreadyAttending {
            attendance_id: record.id.to_string(),
        })
    }

    /// Reopen a provisional COMPLETED record inside the window
    async fn reopen_completed(
        &self,
        mut record: AttendanceRecord,
        meeting: &Meeting,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome> {
        let prior_leave = record.leave_time.unwrap_or(now);
        let period = AbsencePeriod::new(prior_leave, now, AbsenceDetection::ExplicitRejoin);
        let absence_minutes = period.absence_minutes;

        record.metadata.absence_periods.push(period);
        record.metadata.rejoin_count += 1;
        record.metadata.temporary_leave = false;
        record.status = AttendanceStatus::InProgress;
        record.leave_time = None;
        record.timeline.push(TimelineEvent::new(
            EventType::Joined,
            now,
            EventSource::System,
        ));
        self.store.update_record(record.clone()).await?;

        tracing::info!(
            attendance = %record.id,
            absence_minutes,
            "provisional record reopened"
        );

        Ok(JoinOutcome {
            attendance_id: record.id,
            join_time: record.join_time,
            tracking_active: true,
            meeting_url: meeting.meeting_url.clone(),
            rejoin_detected: true,
            absence_minutes: Some(absence_minutes),
        })
    }

    // ======================================================================
    // Leave
    // ======================================================================

    /// Handle a leave-meeting request at the current time
    pub async fn leave_meeting(
        &self,
        attendance_id: &AttendanceId,
        caller: &ParticipantId,
    ) -> Result<LeaveOutcome> {
        self.leave_meeting_at(attendance_id, caller, Utc::now())
            .await
    }

    /// Handle a leave-meeting request at an explicit instant
    pub async fn leave_meeting_at(
        &self,
        attendance_id: &AttendanceId,
        caller: &ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<LeaveOutcome> {
        let lock = self.store.record_lock(attendance_id).await;
        let _guard = lock.lock().await;

        let record = self.store.get_record(attendance_id).await?.ok_or_else(|| {
            ProofMeetError::RecordNotFound {
                attendance_id: attendance_id.to_string(),
            }
        })?;
        if record.participant_id != *caller {
            return Err(ProofMeetError::NotOwner);
        }

        self.apply_leave(record, now, EventSource::System, now).await
    }

    /// Shared leave reconciliation for user leaves and webhook leaves.
    ///
    /// `leave_time` is the source-reported departure; `now` decides whether
    /// the window has closed. Caller must hold the record lock.
    pub(crate) async fn apply_leave(
        &self,
        mut record: AttendanceRecord,
        leave_time: DateTime<Utc>,
        source: EventSource,
        now: DateTime<Utc>,
    ) -> Result<LeaveOutcome> {
        if record.status != AttendanceStatus::InProgress {
            // Whichever of a near-simultaneous webhook left / user leave
            // lands second is a no-op
            return Err(ProofMeetError::NotInProgress {
                attendance_id: record.id.to_string(),
            });
        }

        let meeting = self.meetings.get(&record.meeting_id).await.ok_or_else(|| {
            ProofMeetError::MeetingNotFound {
                meeting_id: record.meeting_id.to_string(),
            }
        })?;

        record
            .timeline
            .push(TimelineEvent::new(EventType::Left, leave_time, source));
        record.leave_time = Some(leave_time);

        let raw = record.raw_duration_minutes();
        let absence = record.metadata.absence_minutes_total();
        let net = (raw - absence).max(0);

        record.total_duration_min = net;
        recompute_activity(&mut record);
        record.attendance_percent = attendance_percent(net, meeting.duration_minutes);
        record.verification_method = record.derive_verification_method();
        record.status = AttendanceStatus::Completed;

        let window_closed = meeting.window_closed(now);
        if !window_closed {
            record.metadata.temporary_leave = true;
            record.metadata.meeting_still_active = true;
            self.store.update_record(record.clone()).await?;

            return Ok(LeaveOutcome {
                attendance_id: record.id,
                duration_min: raw,
                total_duration_min: net,
                absence_minutes: absence,
                attendance_percent: record.attendance_percent,
                status: AttendanceStatus::Completed,
                court_card_generated: false,
                can_rejoin: true,
                minutes_until_close: (meeting.window_end() - now).num_minutes().max(0),
            });
        }

        // Window closed: persist, then finalize on the same code path the
        // sweeper uses (the lock is already held)
        record.metadata.temporary_leave = false;
        record.metadata.meeting_still_active = false;
        self.store.update_record(record.clone()).await?;

        let outcome = self
            .finalize_locked(&record.id, &meeting, "POST_MEETING_LEAVE", now)
            .await?;

        Ok(LeaveOutcome {
            attendance_id: record.id,
            duration_min: raw,
            total_duration_min: net,
            absence_minutes: absence,
            attendance_percent: record.attendance_percent,
            status: outcome.status,
            court_card_generated: outcome.card.is_some(),
            can_rejoin: false,
            minutes_until_close: 0,
        })
    }

    // ======================================================================
    // Heartbeats
    // ======================================================================

    /// Record an activity heartbeat at the current time
    pub async fn record_heartbeat(
        &self,
        attendance_id: &AttendanceId,
        caller: &ParticipantId,
        activity: EventType,
        signals: serde_json::Value,
    ) -> Result<HeartbeatOutcome> {
        self.record_heartbeat_at(attendance_id, caller, activity, signals, Utc::now())
            .await
    }

    /// Record an activity heartbeat at an explicit instant
    pub async fn record_heartbeat_at(
        &self,
        attendance_id: &AttendanceId,
        caller: &ParticipantId,
        activity: EventType,
        signals: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<HeartbeatOutcome> {
        if !matches!(activity, EventType::Active | EventType::Idle) {
            return Err(ProofMeetError::invalid_input(
                "activityType",
                "must be ACTIVE or IDLE",
            ));
        }

        let lock = self.store.record_lock(attendance_id).await;
        let _guard = lock.lock().await;

        let mut record = self.store.get_record(attendance_id).await?.ok_or_else(|| {
            ProofMeetError::RecordNotFound {
                attendance_id: attendance_id.to_string(),
            }
        })?;
        if record.participant_id != *caller {
            return Err(ProofMeetError::NotOwner);
        }
        if record.status != AttendanceStatus::InProgress {
            return Err(ProofMeetError::NotInProgress {
                attendance_id: attendance_id.to_string(),
            });
        }

        record.timeline.push(TimelineEvent::with_data(
            activity,
            now,
            EventSource::FrontendMonitor,
            signals,
        ));
        recompute_activity(&mut record);
        record.verification_method = record.derive_verification_method();
        self.store.update_record(record.clone()).await?;

        Ok(HeartbeatOutcome {
            attendance_id: record.id,
            active_duration_min: record.active_duration_min,
            idle_duration_min: record.idle_duration_min,
            timeline_events: record.timeline.len(),
        })
    }
}

/// Recompute derived activity minutes from the full timeline.
///
/// One heartbeat attributes 30 seconds; derived minutes floor-divide, so
/// replayed or out-of-order events stay idempotent.
pub(crate) fn recompute_activity(record: &mut AttendanceRecord) {
    let active = record.count_events(EventType::Active, EventSource::FrontendMonitor) as i64;
    let idle = record.count_events(EventType::Idle, EventSource::FrontendMonitor) as i64;
    record.active_duration_min = active * HEARTBEAT_INTERVAL_SECS / 60;
    record.idle_duration_min = idle * HEARTBEAT_INTERVAL_SECS / 60;
}

/// Net duration over scheduled duration as a clamped percentage, with the
/// zero-duration division guard
pub(crate) fn attendance_percent(net_minutes: i64, scheduled_minutes: i64) -> f64 {
    if scheduled_minutes <= 0 {
        return 0.0;
    }
    (net_minutes as f64 / scheduled_minutes as f64 * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_percent_guard() {
        assert_eq!(attendance_percent(30, 0), 0.0);
        assert_eq!(attendance_percent(30, 60), 50.0);
        assert_eq!(attendance_percent(90, 60), 100.0);
    }

    #[test]
    fn test_heartbeat_minute_attribution() {
        // 3 heartbeats = 90 s floors to 1 minute
        assert_eq!(3 * HEARTBEAT_INTERVAL_SECS / 60, 1);
        assert_eq!(120 * HEARTBEAT_INTERVAL_SECS / 60, 60);
    }
}
