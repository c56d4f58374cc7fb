pub mod config;
pub mod manager;
pub mod mock;

pub use config::SocketConfig;
pub use manager::{session_room, SocketManager};
pub use mock::MockChannel;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Event vocabulary shared with the backend.
pub mod events {
    /// Fired by the channel layer whenever the physical connection is
    /// (re)established. Subscribers use it to re-issue room joins.
    pub const CONNECT: &str = "connect";
    pub const PING: &str = "ping";

    pub const SESSION_JOIN: &str = "session:join";
    pub const SESSION_LEAVE: &str = "session:leave";

    // Inbound, server -> client.
    pub const SESSION_LIVE_STATUS_UPDATE: &str = "session:liveStatusUpdate";
    pub const SESSION_USER_CONFIRMED: &str = "session:userConfirmed";
    pub const SESSION_USER_END_CONFIRMED: &str = "session:userEndConfirmed";

    // Outbound, client -> server.
    pub const SESSION_USER_CONFIRM: &str = "session:userConfirm";
    pub const SESSION_USER_END_CONFIRM: &str = "session:userEndConfirm";
}

/// Payload of `session:liveStatusUpdate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatusUpdate {
    pub session_id: String,
    pub live_status: String,
}

/// Payload of the confirmation events, both inbound and outbound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserConfirmation {
    pub session_id: String,
    pub user_id: String,
}

pub type SubscriptionId = u64;

/// Handler invoked with the JSON payload of a named event.
pub type EventHandler = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Returned by [`RealtimeChannel::emit`] when the underlying connection is
/// down. The caller keeps any optimistic local state it already applied and
/// decides whether to retry or surface a reconnecting indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelUnavailable;

impl fmt::Display for ChannelUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "realtime channel is not connected")
    }
}

impl std::error::Error for ChannelUnavailable {}

/// Handle to the app's shared realtime connection. One physical connection is
/// multiplexed across logical rooms; several live-session controllers may
/// hold the same channel and must filter inbound events themselves.
///
/// Implementations own the reconnect policy and fire [`events::CONNECT`]
/// after every (re)establishment of the link.
pub trait RealtimeChannel: Send + Sync {
    fn join(&self, room: &str);
    fn leave(&self, room: &str);
    /// Registers a handler for a named event. Every registration must be
    /// released with a matching [`RealtimeChannel::off`].
    fn on(&self, event: &str, handler: EventHandler) -> SubscriptionId;
    fn off(&self, event: &str, id: SubscriptionId);
    fn emit(&self, event: &str, payload: serde_json::Value) -> Result<(), ChannelUnavailable>;
    fn is_connected(&self) -> bool;
}
