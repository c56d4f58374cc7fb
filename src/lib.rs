//! Client-side core for the live care-session feature: mirrors the backend's
//! authoritative session lifecycle over a realtime channel, coordinates
//! mutual start/end confirmations between the two participants, and derives
//! the live elapsed-time display.

pub mod models;
pub mod session;
pub mod socket;

pub use models::{parse_timestamp, RawTimestamp, SessionSnapshot, SessionStatus};
pub use session::{
    active_live_session, map_live_status, ElapsedTimer, LiveSessionController,
    LiveSessionSnapshot, LiveSessionStatus,
};
pub use socket::{ChannelUnavailable, RealtimeChannel, SocketConfig, SocketManager};
