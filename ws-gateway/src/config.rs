//! Gateway configuration.

use std::time::Duration;

/// Configuration for the WebSocket gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// TCP port to listen on. Port 0 binds an ephemeral port, which tests use.
    pub listen_port: u16,
    /// How long the reader waits for a pong before declaring the session dead.
    pub pong_wait: Duration,
    /// Maximum size of one inbound frame in bytes.
    pub max_frame_size: usize,
    /// Depth of the per-session outbound message queue.
    pub message_buffer_size: usize,
}

impl GatewayConfig {
    /// Interval between keepalive pings, derived from `pong_wait`.
    ///
    /// Pings must fire comfortably inside the pong deadline; the 0.9 ratio
    /// leaves one full round trip of slack.
    pub fn ping_period(&self) -> Duration {
        self.pong_wait.mul_f64(0.9)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_port: 9090,
            pong_wait: Duration::from_secs(60),
            max_frame_size: 512,
            message_buffer_size: 64,
        }
    }
}
