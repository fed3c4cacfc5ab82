//! Driver configuration.

use std::time::Duration;

use remote_core::CoreConfig;
use ws_gateway::GatewayConfig;

/// Configuration for an integration driver.
///
/// The defaults match the protocol's expectations; most drivers only ever
/// change `listen_port` and `device_id`.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// TCP port the WebSocket endpoint listens on. 0 binds an ephemeral
    /// port.
    pub listen_port: u16,
    /// Pong deadline for the keepalive; the ping interval derives from it.
    pub pong_wait: Duration,
    /// Maximum inbound frame size in bytes.
    pub max_frame_size: usize,
    /// Depth of the outbound message queue.
    pub message_buffer_size: usize,
    /// Device id reported in `device_state` events.
    pub device_id: Option<String>,
    /// Pause between announcing CONNECTING and starting the collaborator's
    /// connect attempt.
    pub connect_announce_delay: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            listen_port: 9090,
            pong_wait: Duration::from_secs(60),
            max_frame_size: 512,
            message_buffer_size: 64,
            device_id: None,
            connect_announce_delay: Duration::from_secs(1),
        }
    }
}

impl DriverConfig {
    pub(crate) fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            listen_port: self.listen_port,
            pong_wait: self.pong_wait,
            max_frame_size: self.max_frame_size,
            message_buffer_size: self.message_buffer_size,
        }
    }

    pub(crate) fn core(&self) -> CoreConfig {
        CoreConfig {
            device_id: self.device_id.clone(),
            connect_announce_delay: self.connect_announce_delay,
        }
    }
}
