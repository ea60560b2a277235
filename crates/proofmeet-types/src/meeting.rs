//! Meetings and the scheduled finalization window

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::MeetingId;

/// A scheduled recovery meeting, read-only to the attendance core.
///
/// Meeting discovery and sync from third-party directories happen outside
/// the engine; the core only consumes the scheduled window and the email
/// participants are expected to join with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: MeetingId,
    pub name: String,
    /// Program this meeting belongs to (AA, NA, SMART, ...)
    pub program: String,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i64,
    /// Email the webhook is expected to report for matched participants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_join_email: Option<String>,
    /// Join URL handed back to participants on join-meeting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_url: Option<String>,
}

impl Meeting {
    /// End of the scheduled window: `scheduled_start + duration_minutes`.
    ///
    /// Finalization is legal only after this instant; before it, leaves are
    /// provisional and re-joins are allowed.
    pub fn window_end(&self) -> DateTime<Utc> {
        self.scheduled_start + Duration::minutes(self.duration_minutes)
    }

    /// Whether the scheduled window has closed as of `now`
    pub fn window_closed(&self, now: DateTime<Utc>) -> bool {
        now > self.window_end()
    }

    /// Whole minutes since the window closed (zero if still open)
    pub fn minutes_since_close(&self, now: DateTime<Utc>) -> i64 {
        (now - self.window_end()).num_minutes().max(0)
    }

    /// Calendar day of the scheduled start
    pub fn date(&self) -> NaiveDate {
        self.scheduled_start.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meeting() -> Meeting {
        Meeting {
            id: MeetingId::from_string("mtg_test"),
            name: "Morning Serenity".to_string(),
            program: "AA".to_string(),
            scheduled_start: Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap(),
            duration_minutes: 60,
            expected_join_email: None,
            meeting_url: None,
        }
    }

    #[test]
    fn test_window_end() {
        let m = meeting();
        assert_eq!(
            m.window_end(),
            Utc.with_ymd_and_hms(2025, 3, 10, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_window_closed_is_strict() {
        let m = meeting();
        // Exactly at the boundary the window is still open
        assert!(!m.window_closed(m.window_end()));
        assert!(m.window_closed(m.window_end() + Duration::seconds(1)));
    }

    #[test]
    fn test_minutes_since_close() {
        let m = meeting();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 11, 12, 0).unwrap();
        assert_eq!(m.minutes_since_close(now), 12);
        assert_eq!(m.minutes_since_close(m.scheduled_start), 0);
    }
}
