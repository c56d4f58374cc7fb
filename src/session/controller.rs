use std::sync::{Arc, Mutex, PoisonError, Weak};

use anyhow::Result;
use log::{debug, info, warn};
use serde::Serialize;

use crate::models::{SessionSnapshot, SessionStatus};
use crate::socket::{
    events, session_room, EventHandler, LiveStatusUpdate, RealtimeChannel, SubscriptionId,
    UserConfirmation,
};

use super::state::LiveSessionState;
use super::status::{map_live_status, LiveSessionStatus};

/// Invoked exactly once per controller instance when the session reaches
/// `Completed`, with the session id. The presentation layer uses it to
/// navigate to the completion screen.
pub type CompletionCallback = Box<dyn FnMut(&str) + Send>;

/// Read-only view of the runtime state handed to the presentation layer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LiveSessionSnapshot {
    pub status: LiveSessionStatus,
    pub user_confirmed: bool,
    pub other_user_confirmed: bool,
    pub user_end_confirmed: bool,
    pub other_user_end_confirmed: bool,
}

/// Mediates between inbound realtime events, outbound user actions, and the
/// authoritative backend snapshot for exactly one session.
///
/// The channel is shared process-wide, so every inbound handler filters on
/// this controller's session id and `detach` releases every registration.
pub struct LiveSessionController {
    session_id: String,
    user_id: String,
    channel: Arc<dyn RealtimeChannel>,
    state: Arc<Mutex<LiveSessionState>>,
    subscriptions: Mutex<Vec<(&'static str, SubscriptionId)>>,
    on_completed: Arc<Mutex<Option<CompletionCallback>>>,
}

impl LiveSessionController {
    pub fn new(
        snapshot: &SessionSnapshot,
        user_id: impl Into<String>,
        channel: Arc<dyn RealtimeChannel>,
    ) -> Self {
        let initial = map_live_status(snapshot.live_status.as_deref());
        Self {
            session_id: snapshot.id.clone(),
            user_id: user_id.into(),
            channel,
            state: Arc::new(Mutex::new(LiveSessionState::new(initial))),
            subscriptions: Mutex::new(Vec::new()),
            on_completed: Arc::new(Mutex::new(None)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn status(&self) -> LiveSessionStatus {
        lock(&self.state).status
    }

    pub fn snapshot(&self) -> LiveSessionSnapshot {
        let state = lock(&self.state);
        LiveSessionSnapshot {
            status: state.status,
            user_confirmed: state.user_confirmed,
            other_user_confirmed: state.other_user_confirmed,
            user_end_confirmed: state.user_end_confirmed,
            other_user_end_confirmed: state.other_user_end_confirmed,
        }
    }

    /// Registers the completion signal. Fires at most once, even across
    /// redundant snapshot refreshes.
    pub fn set_on_completed(&self, callback: CompletionCallback) {
        *lock(&self.on_completed) = Some(callback);
    }

    /// Joins this session's room and registers the inbound event handlers.
    /// Idempotent; a second call while attached is a no-op.
    pub fn attach(&self) {
        let mut subscriptions = lock(&self.subscriptions);
        if !subscriptions.is_empty() {
            return;
        }

        let room = session_room(&self.session_id);
        self.channel.join(&room);
        info!("attached to live session {}", self.session_id);

        let status_handler: EventHandler = {
            let state = self.state.clone();
            let session_id = self.session_id.clone();
            let on_completed = self.on_completed.clone();
            Arc::new(move |payload| {
                let Ok(update) = serde_json::from_value::<LiveStatusUpdate>(payload.clone())
                else {
                    warn!("dropping malformed live status update: {payload}");
                    return;
                };
                if update.session_id != session_id {
                    return;
                }
                debug!("live status update for {session_id}: {}", update.live_status);
                let completed = {
                    let mut state = lock(&state);
                    state.apply_status(map_live_status(Some(&update.live_status)));
                    state.take_completion_signal()
                };
                if completed {
                    fire_completed(&on_completed, &session_id);
                }
            })
        };
        subscriptions.push((
            events::SESSION_LIVE_STATUS_UPDATE,
            self.channel.on(events::SESSION_LIVE_STATUS_UPDATE, status_handler),
        ));

        let confirm_handler: EventHandler = {
            let state = self.state.clone();
            let session_id = self.session_id.clone();
            let user_id = self.user_id.clone();
            Arc::new(move |payload| {
                let Ok(confirmation) = serde_json::from_value::<UserConfirmation>(payload.clone())
                else {
                    return;
                };
                if confirmation.session_id != session_id {
                    return;
                }
                lock(&state).apply_confirmation(&confirmation.user_id, &user_id);
            })
        };
        subscriptions.push((
            events::SESSION_USER_CONFIRMED,
            self.channel.on(events::SESSION_USER_CONFIRMED, confirm_handler),
        ));

        let end_confirm_handler: EventHandler = {
            let state = self.state.clone();
            let session_id = self.session_id.clone();
            let user_id = self.user_id.clone();
            Arc::new(move |payload| {
                let Ok(confirmation) = serde_json::from_value::<UserConfirmation>(payload.clone())
                else {
                    return;
                };
                if confirmation.session_id != session_id {
                    return;
                }
                lock(&state).apply_end_confirmation(&confirmation.user_id, &user_id);
            })
        };
        subscriptions.push((
            events::SESSION_USER_END_CONFIRMED,
            self.channel
                .on(events::SESSION_USER_END_CONFIRMED, end_confirm_handler),
        ));

        // Room membership does not survive a reconnect; re-issue the join
        // whenever the channel layer reports the link came back.
        let connect_handler: EventHandler = {
            let weak_channel: Weak<dyn RealtimeChannel> = Arc::downgrade(&self.channel);
            let room = room.clone();
            Arc::new(move |_| {
                if let Some(channel) = weak_channel.upgrade() {
                    debug!("rejoining {room} after reconnect");
                    channel.join(&room);
                }
            })
        };
        subscriptions.push((
            events::CONNECT,
            self.channel.on(events::CONNECT, connect_handler),
        ));
    }

    /// Releases every event registration and leaves the session room.
    /// Idempotent; also runs on drop.
    pub fn detach(&self) {
        let mut subscriptions = lock(&self.subscriptions);
        if subscriptions.is_empty() {
            return;
        }
        for (event, id) in subscriptions.drain(..) {
            self.channel.off(event, id);
        }
        self.channel.leave(&session_room(&self.session_id));
        info!("detached from live session {}", self.session_id);
    }

    /// Signals this user is ready to start. The local flag is set
    /// optimistically before the emit; when the channel is down the flag
    /// stays set and `ChannelUnavailable` is returned so the caller can
    /// retry or show a reconnecting indicator.
    pub fn confirm_session(&self) -> Result<()> {
        lock(&self.state).confirm_locally();
        info!("confirming session {} as {}", self.session_id, self.user_id);
        self.emit_confirmation(events::SESSION_USER_CONFIRM)
    }

    /// Signals this user is ready to end. Same optimistic semantics as
    /// [`LiveSessionController::confirm_session`].
    pub fn confirm_end_session(&self) -> Result<()> {
        lock(&self.state).confirm_end_locally();
        info!(
            "confirming end of session {} as {}",
            self.session_id, self.user_id
        );
        self.emit_confirmation(events::SESSION_USER_END_CONFIRM)
    }

    fn emit_confirmation(&self, event: &str) -> Result<()> {
        let payload = serde_json::to_value(UserConfirmation {
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
        })?;
        self.channel.emit(event, payload)?;
        Ok(())
    }

    /// Reconciliation path: adopts the status carried by a refreshed backend
    /// snapshot, keeping the client in sync even when realtime events were
    /// missed. A booking marked `Completed` forces the terminal status
    /// regardless of its live status.
    pub fn sync_snapshot(&self, snapshot: &SessionSnapshot) {
        if snapshot.id != self.session_id {
            return;
        }
        let completed = {
            let mut state = lock(&self.state);
            if snapshot.status == SessionStatus::Completed {
                state.apply_status(LiveSessionStatus::Completed);
            } else if let Some(raw) = snapshot.live_status.as_deref() {
                state.apply_status(map_live_status(Some(raw)));
            }
            state.take_completion_signal()
        };
        if completed {
            fire_completed(&self.on_completed, &self.session_id);
        }
    }

    /// Completion detection against the completed-sessions collection: if
    /// this session appears there, force the terminal status.
    pub fn observe_completed(&self, completed: &[SessionSnapshot]) {
        if !completed.iter().any(|s| s.id == self.session_id) {
            return;
        }
        let completed = {
            let mut state = lock(&self.state);
            state.apply_status(LiveSessionStatus::Completed);
            state.take_completion_signal()
        };
        if completed {
            fire_completed(&self.on_completed, &self.session_id);
        }
    }
}

impl Drop for LiveSessionController {
    fn drop(&mut self) {
        self.detach();
    }
}

fn fire_completed(callback: &Mutex<Option<CompletionCallback>>, session_id: &str) {
    info!("session {session_id} completed");
    if let Some(callback) = lock(callback).as_mut() {
        callback(session_id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
