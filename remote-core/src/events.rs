//! Inbound event dispatch.
//!
//! Events from the remote carry no id and get no response; they update the
//! standby gate, drive the device-connection flow, or mark the setup flow
//! aborted.

use tracing::{debug, info, warn};

use remote_proto::messages::event;
use remote_proto::{DeviceState, InboundEvent};

use crate::handler::ConnectionEvent;
use crate::integration::Integration;

impl Integration {
    pub(crate) fn handle_remote_event(&mut self, ev: InboundEvent) {
        debug!(msg = %ev.msg, "event received");

        match ev.msg.as_str() {
            event::ENTER_STANDBY => {
                info!("remote entered standby, suppressing outbound events");
                self.standby = true;
            }
            event::EXIT_STANDBY => {
                info!("remote left standby");
                self.standby = false;
            }
            event::CONNECT => self.on_connect(),
            event::DISCONNECT => self.on_disconnect(),
            event::ABORT_DRIVER_SETUP => {
                warn!("remote aborted driver setup");
                self.setup.abort();
            }
            other => warn!(msg = other, "unknown event"),
        }
    }

    fn on_connect(&mut self) {
        if !self.device_state.can_connect() {
            // Not a state to connect from; re-announce so the remote's UI
            // stays in sync.
            debug!(state = %self.device_state.current(), "connect ignored, re-announcing state");
            self.announce_device_state();
            return;
        }

        self.device_state.set(DeviceState::Connecting);
        self.announce_device_state();

        // The pause lets the CONNECTING announcement reach the wire before
        // the attempt's own state changes can race it. The attempt itself is
        // owned by the collaborator, which reports the outcome through
        // set_device_state.
        let handler = self.handler.clone();
        let driver = self.handle.clone();
        let delay = self.config.connect_announce_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            handler
                .connection_event(driver, ConnectionEvent::Connect)
                .await;
        });
    }

    fn on_disconnect(&mut self) {
        if !self.device_state.can_disconnect() {
            debug!(state = %self.device_state.current(), "disconnect ignored");
            return;
        }

        let handler = self.handler.clone();
        let driver = self.handle.clone();
        tokio::spawn(async move {
            handler
                .connection_event(driver, ConnectionEvent::Disconnect)
                .await;
        });
    }
}
