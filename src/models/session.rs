use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp::RawTimestamp;

/// Booking-level lifecycle vocabulary, exactly as the backend emits it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    NewRequest,
    Pending,
    Confirmed,
    Rejected,
    Declined,
    Cancelled,
    InProgress,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::NewRequest => "newRequest",
            SessionStatus::Pending => "pending",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Rejected => "rejected",
            SessionStatus::Declined => "declined",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::InProgress => "inProgress",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

/// The server-owned record for one booking, as delivered by the session query
/// service. Only the fields the live-session core consumes are modeled here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: SessionStatus,
    /// Raw live-status string; mapped through `map_live_status` before use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_status: Option<String>,
    /// When `live_status` last changed. Drives the elapsed timer while the
    /// session is started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_status_updated_at: Option<RawTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SessionSnapshot {
    /// Whether the given user created this session request.
    pub fn initiated_by(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_timestamp;
    use serde_json::json;

    #[test]
    fn decodes_backend_wire_format() {
        let snapshot: SessionSnapshot = serde_json::from_value(json!({
            "id": "sess-1",
            "senderId": "user-a",
            "receiverId": "user-b",
            "status": "inProgress",
            "liveStatus": "started",
            "liveStatusUpdatedAt": { "_seconds": 1714558200, "_nanoseconds": 0 },
            "startTime": "2024-05-01T10:00:00Z",
            "endTime": "2024-05-01T12:00:00Z",
            "note": "bring the walker"
        }))
        .unwrap();

        assert_eq!(snapshot.status, SessionStatus::InProgress);
        assert_eq!(snapshot.live_status.as_deref(), Some("started"));
        assert!(snapshot.initiated_by("user-a"));
        assert!(!snapshot.initiated_by("user-b"));
        let updated = snapshot.live_status_updated_at.as_ref().unwrap();
        assert!(parse_timestamp(updated).is_some());
    }

    #[test]
    fn optional_live_fields_may_be_absent() {
        let snapshot: SessionSnapshot = serde_json::from_value(json!({
            "id": "sess-2",
            "senderId": "user-a",
            "receiverId": "user-b",
            "status": "pending"
        }))
        .unwrap();

        assert!(snapshot.live_status.is_none());
        assert!(snapshot.live_status_updated_at.is_none());
        assert!(snapshot.start_time.is_none());
    }
}
