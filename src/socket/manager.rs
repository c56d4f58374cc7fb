//! Shared-connection bookkeeping: which session rooms this client is in,
//! rejoining them after a reconnect, and the keepalive heartbeat.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{events, RealtimeChannel, SocketConfig, SubscriptionId};

/// Logical room key for one session's live events.
pub fn session_room(session_id: &str) -> String {
    format!("session:{session_id}")
}

pub struct SocketManager {
    channel: Arc<dyn RealtimeChannel>,
    config: SocketConfig,
    rooms: Arc<Mutex<HashSet<String>>>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
    connect_sub: Mutex<Option<SubscriptionId>>,
    cancel: CancellationToken,
}

impl SocketManager {
    pub fn new(channel: Arc<dyn RealtimeChannel>, config: SocketConfig) -> Self {
        Self {
            channel,
            config,
            rooms: Arc::new(Mutex::new(HashSet::new())),
            heartbeat: Mutex::new(None),
            connect_sub: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Registers the reconnect handler and spawns the heartbeat task.
    pub fn start(&self) {
        let weak_channel: Weak<dyn RealtimeChannel> = Arc::downgrade(&self.channel);
        let rooms = self.rooms.clone();
        let sub = self.channel.on(
            events::CONNECT,
            Arc::new(move |_| {
                if let Some(channel) = weak_channel.upgrade() {
                    rejoin_active_rooms(channel.as_ref(), &rooms);
                }
            }),
        );
        *lock(&self.connect_sub) = Some(sub);

        let channel = self.channel.clone();
        let cancel = self.cancel.clone();
        let interval = self.config.heartbeat_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if channel.is_connected() {
                            let _ = channel.emit(events::PING, json!(Utc::now().timestamp_millis()));
                            debug!("heartbeat sent");
                        }
                    }
                }
            }
        });
        *lock(&self.heartbeat) = Some(handle);
    }

    pub fn join_session_room(&self, session_id: &str) {
        if !self.channel.is_connected() {
            warn!("cannot join session room {session_id}: channel not connected");
            return;
        }
        let room = session_room(session_id);
        lock(&self.rooms).insert(room.clone());
        self.channel.join(&room);
        debug!("joined session room {room}");
    }

    pub fn leave_session_room(&self, session_id: &str) {
        if !self.channel.is_connected() {
            warn!("cannot leave session room {session_id}: channel not connected");
            return;
        }
        let room = session_room(session_id);
        lock(&self.rooms).remove(&room);
        self.channel.leave(&room);
        debug!("left session room {room}");
    }

    pub fn active_room_count(&self) -> usize {
        lock(&self.rooms).len()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = lock(&self.heartbeat).take() {
            handle.abort();
        }
        if let Some(sub) = lock(&self.connect_sub).take() {
            self.channel.off(events::CONNECT, sub);
        }
    }
}

impl Drop for SocketManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn rejoin_active_rooms(channel: &dyn RealtimeChannel, rooms: &Mutex<HashSet<String>>) {
    let rooms: Vec<String> = lock(rooms).iter().cloned().collect();
    if rooms.is_empty() {
        return;
    }
    info!("rejoining {} active rooms after reconnect", rooms.len());
    for room in rooms {
        channel.join(&room);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::MockChannel;
    use serde_json::Value;

    #[tokio::test]
    async fn tracks_rooms_and_rejoins_after_reconnect() {
        let channel = Arc::new(MockChannel::new());
        let manager = SocketManager::new(channel.clone(), SocketConfig::default());
        manager.start();

        manager.join_session_room("sess-1");
        manager.join_session_room("sess-2");
        assert_eq!(manager.active_room_count(), 2);
        assert_eq!(channel.join_log().len(), 2);

        // Transport drops and comes back; the connect event triggers rejoins.
        channel.set_connected(false);
        channel.set_connected(true);
        channel.dispatch(events::CONNECT, &Value::Null);

        assert_eq!(channel.join_log().len(), 4);
        assert!(channel.joined_rooms().contains("session:sess-1"));
        assert!(channel.joined_rooms().contains("session:sess-2"));

        manager.shutdown();
    }

    #[tokio::test]
    async fn join_is_skipped_while_disconnected() {
        let channel = Arc::new(MockChannel::new());
        channel.set_connected(false);
        let manager = SocketManager::new(channel.clone(), SocketConfig::default());
        manager.start();

        manager.join_session_room("sess-1");
        assert_eq!(manager.active_room_count(), 0);
        assert!(channel.join_log().is_empty());
    }

    #[tokio::test]
    async fn leave_forgets_the_room() {
        let channel = Arc::new(MockChannel::new());
        let manager = SocketManager::new(channel.clone(), SocketConfig::default());
        manager.start();

        manager.join_session_room("sess-1");
        manager.leave_session_room("sess-1");
        assert_eq!(manager.active_room_count(), 0);
        assert!(!channel.joined_rooms().contains("session:sess-1"));

        // A later reconnect must not resurrect the room.
        channel.dispatch(events::CONNECT, &Value::Null);
        assert_eq!(channel.join_log().len(), 1);
    }
}
