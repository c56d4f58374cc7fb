use serde::Serialize;

use super::status::LiveSessionStatus;

/// Runtime state for one rendered session: the mirrored status plus the two
/// confirmation pairs. Pure; all I/O lives in the controller.
///
/// Confirmation flags are only meaningful while the status is `Ready` (start
/// pair) or `Ending` (end pair), so each pair is cleared when the status
/// moves away from its associated phase.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LiveSessionState {
    pub status: LiveSessionStatus,
    pub user_confirmed: bool,
    pub other_user_confirmed: bool,
    pub user_end_confirmed: bool,
    pub other_user_end_confirmed: bool,
    #[serde(skip)]
    completion_signaled: bool,
}

impl Default for LiveSessionState {
    fn default() -> Self {
        Self::new(LiveSessionStatus::Waiting)
    }
}

impl LiveSessionState {
    pub fn new(status: LiveSessionStatus) -> Self {
        Self {
            status,
            user_confirmed: false,
            other_user_confirmed: false,
            user_end_confirmed: false,
            other_user_end_confirmed: false,
            completion_signaled: false,
        }
    }

    /// Adopts whatever status the server reports. The server is the single
    /// source of truth; no transition table is enforced here beyond clearing
    /// confirmation pairs that no longer apply.
    pub fn apply_status(&mut self, next: LiveSessionStatus) {
        if next == self.status {
            return;
        }
        if self.status == LiveSessionStatus::Ready {
            self.user_confirmed = false;
            self.other_user_confirmed = false;
        }
        if self.status == LiveSessionStatus::Ending {
            self.user_end_confirmed = false;
            self.other_user_end_confirmed = false;
        }
        self.status = next;
    }

    /// Records a start confirmation from either party. Idempotent.
    pub fn apply_confirmation(&mut self, event_user_id: &str, local_user_id: &str) {
        if event_user_id == local_user_id {
            self.user_confirmed = true;
        } else {
            self.other_user_confirmed = true;
        }
    }

    /// Records an end confirmation from either party. Idempotent.
    pub fn apply_end_confirmation(&mut self, event_user_id: &str, local_user_id: &str) {
        if event_user_id == local_user_id {
            self.user_end_confirmed = true;
        } else {
            self.other_user_end_confirmed = true;
        }
    }

    /// Optimistic local flag set before the server acknowledges; the
    /// authoritative value still arrives via `apply_confirmation`.
    pub fn confirm_locally(&mut self) {
        self.user_confirmed = true;
    }

    pub fn confirm_end_locally(&mut self) {
        self.user_end_confirmed = true;
    }

    /// True exactly once, the first time the status is `Completed`. Guards
    /// the one-shot completion signal to the presentation layer.
    pub fn take_completion_signal(&mut self) -> bool {
        if self.status == LiveSessionStatus::Completed && !self.completion_signaled {
            self.completion_signaled = true;
            true
        } else {
            false
        }
    }
}
