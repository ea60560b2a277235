//! Timeline events
//!
//! Every ingress channel appends `TimelineEvent`s to an attendance record.
//! Events append in acceptance order (server clock); the source timestamp
//! is preserved inside the event for later reconstruction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which channel produced a timeline event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSource {
    /// The video-conferencing provider's webhook
    Webhook,
    /// The participant-side browser activity monitor
    FrontendMonitor,
    /// The engine itself
    System,
}

/// What a timeline event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Joined,
    Left,
    Active,
    Idle,
    Reaction,
    System,
}

/// An appended `{type, timestamp, source, data}` datum; never edited
/// after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Source-reported timestamp (not the server acceptance time)
    pub timestamp: DateTime<Utc>,
    pub source: EventSource,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl TimelineEvent {
    /// Build an event with empty data
    pub fn new(event_type: EventType, timestamp: DateTime<Utc>, source: EventSource) -> Self {
        Self {
            event_type,
            timestamp,
            source,
            data: serde_json::Value::Null,
        }
    }

    /// Build an event carrying a data payload
    pub fn with_data(
        event_type: EventType,
        timestamp: DateTime<Utc>,
        source: EventSource,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event_type,
            timestamp,
            source,
            data,
        }
    }

    /// Whether this event came from the participant-side monitor
    pub fn is_monitor_event(&self) -> bool {
        self.source == EventSource::FrontendMonitor
    }

    /// Read a boolean flag out of the event data
    pub fn data_flag(&self, key: &str) -> bool {
        self.data
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Activity signals attached to a heartbeat event's data payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatSignals {
    #[serde(default)]
    pub tab_focused: bool,
    #[serde(default)]
    pub mouse_movement: bool,
    #[serde(default)]
    pub keyboard_activity: bool,
    #[serde(default)]
    pub audio_active: bool,
    #[serde(default)]
    pub video_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_uses_wire_names() {
        let event = TimelineEvent::new(EventType::Joined, Utc::now(), EventSource::Webhook);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "JOINED");
        assert_eq!(json["source"], "WEBHOOK");
    }

    #[test]
    fn test_data_flag() {
        let signals = HeartbeatSignals {
            video_active: true,
            ..Default::default()
        };
        let event = TimelineEvent::with_data(
            EventType::Active,
            Utc::now(),
            EventSource::FrontendMonitor,
            serde_json::to_value(&signals).unwrap(),
        );
        assert!(event.data_flag("videoActive"));
        assert!(!event.data_flag("audioActive"));
    }
}
