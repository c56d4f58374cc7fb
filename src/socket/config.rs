use std::time::Duration;

/// Tuning for the shared realtime connection. Defaults match the production
/// client configuration.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// How often the manager sends a keepalive `ping` while connected.
    pub heartbeat_interval: Duration,
    pub reconnection_attempts: u32,
    pub reconnection_delay: Duration,
    pub reconnection_delay_max: Duration,
    pub connect_timeout: Duration,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            reconnection_attempts: 5,
            reconnection_delay: Duration::from_secs(1),
            reconnection_delay_max: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
        }
    }
}
