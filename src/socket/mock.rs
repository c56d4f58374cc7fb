//! In-memory [`RealtimeChannel`] for tests and local development.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use super::{ChannelUnavailable, EventHandler, RealtimeChannel, SubscriptionId};

#[derive(Default)]
struct Inner {
    connected: bool,
    rooms: HashSet<String>,
    join_log: Vec<String>,
    handlers: HashMap<String, Vec<(SubscriptionId, EventHandler)>>,
    emitted: Vec<(String, Value)>,
}

/// Records joins and emits, and lets a test dispatch inbound events and
/// toggle connectivity.
pub struct MockChannel {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                connected: true,
                ..Inner::default()
            }),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    /// Delivers an inbound event to every registered handler, the way the
    /// transport would. Handlers are invoked outside the internal lock so
    /// they may call back into the channel.
    pub fn dispatch(&self, event: &str, payload: &Value) {
        let handlers: Vec<EventHandler> = self
            .lock()
            .handlers
            .get(event)
            .map(|entries| entries.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();
        for handler in handlers {
            handler(payload);
        }
    }

    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.lock().emitted.clone()
    }

    pub fn emitted_count(&self, event: &str) -> usize {
        self.lock().emitted.iter().filter(|(e, _)| e == event).count()
    }

    pub fn joined_rooms(&self) -> HashSet<String> {
        self.lock().rooms.clone()
    }

    /// Every join ever issued, including rejoins of the same room.
    pub fn join_log(&self) -> Vec<String> {
        self.lock().join_log.clone()
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.lock().handlers.get(event).map_or(0, Vec::len)
    }
}

impl RealtimeChannel for MockChannel {
    fn join(&self, room: &str) {
        let mut inner = self.lock();
        inner.rooms.insert(room.to_string());
        inner.join_log.push(room.to_string());
    }

    fn leave(&self, room: &str) {
        self.lock().rooms.remove(room);
    }

    fn on(&self, event: &str, handler: EventHandler) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock()
            .handlers
            .entry(event.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    fn off(&self, event: &str, id: SubscriptionId) {
        if let Some(entries) = self.lock().handlers.get_mut(event) {
            entries.retain(|(entry_id, _)| *entry_id != id);
        }
    }

    fn emit(&self, event: &str, payload: Value) -> Result<(), ChannelUnavailable> {
        let mut inner = self.lock();
        if !inner.connected {
            return Err(ChannelUnavailable);
        }
        inner.emitted.push((event.to_string(), payload));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn off_detaches_only_the_matching_subscription() {
        let channel = MockChannel::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_a = hits.clone();
        let a = channel.on("evt", Arc::new(move |_| {
            hits_a.fetch_add(1, Ordering::Relaxed);
        }));
        let hits_b = hits.clone();
        let _b = channel.on("evt", Arc::new(move |_| {
            hits_b.fetch_add(10, Ordering::Relaxed);
        }));

        channel.off("evt", a);
        channel.dispatch("evt", &json!({}));
        assert_eq!(hits.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn emit_fails_while_disconnected() {
        let channel = MockChannel::new();
        channel.set_connected(false);
        assert_eq!(channel.emit("evt", json!({})), Err(ChannelUnavailable));
        assert!(channel.emitted().is_empty());
    }
}
