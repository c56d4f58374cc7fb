pub mod controller;
pub mod countdown;
pub mod elapsed;
pub mod state;
pub mod status;

pub use controller::{CompletionCallback, LiveSessionController, LiveSessionSnapshot};
pub use countdown::{countdown_to_start, Countdown};
pub use elapsed::ElapsedTimer;
pub use state::LiveSessionState;
pub use status::{map_live_status, LiveSessionStatus};

use crate::models::{SessionSnapshot, SessionStatus};

/// Picks the one session the live-session surface should render: a booking
/// already in progress, or a confirmed one whose live status says it is
/// about to start.
pub fn active_live_session(sessions: &[SessionSnapshot]) -> Option<&SessionSnapshot> {
    sessions.iter().find(|session| {
        session.status == SessionStatus::InProgress
            || (session.status == SessionStatus::Confirmed
                && matches!(session.live_status.as_deref(), Some("upcoming") | Some("ready")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, status: SessionStatus, live_status: Option<&str>) -> SessionSnapshot {
        SessionSnapshot {
            id: id.into(),
            sender_id: "user-a".into(),
            receiver_id: "user-b".into(),
            status,
            live_status: live_status.map(str::to_owned),
            live_status_updated_at: None,
            start_time: None,
            end_time: None,
            note: None,
        }
    }

    #[test]
    fn prefers_the_first_matching_session() {
        let sessions = vec![
            session("s1", SessionStatus::Pending, None),
            session("s2", SessionStatus::Confirmed, Some("ready")),
            session("s3", SessionStatus::InProgress, Some("started")),
        ];
        assert_eq!(active_live_session(&sessions).map(|s| s.id.as_str()), Some("s2"));
    }

    #[test]
    fn in_progress_wins_regardless_of_live_status() {
        let sessions = vec![session("s1", SessionStatus::InProgress, None)];
        assert_eq!(active_live_session(&sessions).map(|s| s.id.as_str()), Some("s1"));
    }

    #[test]
    fn confirmed_without_live_window_is_not_live() {
        let sessions = vec![
            session("s1", SessionStatus::Confirmed, None),
            session("s2", SessionStatus::Confirmed, Some("completed")),
            session("s3", SessionStatus::Completed, Some("completed")),
        ];
        assert!(active_live_session(&sessions).is_none());
    }
}
