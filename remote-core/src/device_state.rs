//! The device-connection state machine.
//!
//! The engine records and re-broadcasts whatever state the device
//! collaborator reports; the only transitions it gates itself are the ones
//! triggered by remote `connect`/`disconnect` events.

use remote_proto::DeviceState;

/// Tracks the connection state of the integrated device.
///
/// DISCONNECTED → CONNECTING → CONNECTED → {DISCONNECTED, ERROR};
/// ERROR → CONNECTING (retry) or DISCONNECTED. CONNECTING is transient and
/// owned by the collaborator: the engine announces it, then waits for the
/// collaborator to report the outcome.
#[derive(Debug)]
pub struct DeviceStateTracker {
    state: DeviceState,
}

impl Default for DeviceStateTracker {
    fn default() -> Self {
        Self {
            state: DeviceState::Disconnected,
        }
    }
}

impl DeviceStateTracker {
    /// Current state.
    pub fn current(&self) -> DeviceState {
        self.state
    }

    /// Record a new state, returning the previous one.
    pub fn set(&mut self, state: DeviceState) -> DeviceState {
        std::mem::replace(&mut self.state, state)
    }

    /// Whether a remote `connect` event may start an attempt.
    ///
    /// Only from DISCONNECTED or ERROR; anything else is a no-op that merely
    /// re-announces the current state so the remote's UI stays in sync.
    pub fn can_connect(&self) -> bool {
        matches!(
            self.state,
            DeviceState::Disconnected | DeviceState::Error
        )
    }

    /// Whether a remote `disconnect` event is acted upon.
    pub fn can_disconnect(&self) -> bool {
        self.state == DeviceState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected() {
        let tracker = DeviceStateTracker::default();
        assert_eq!(tracker.current(), DeviceState::Disconnected);
        assert!(tracker.can_connect());
        assert!(!tracker.can_disconnect());
    }

    #[test]
    fn connect_allowed_from_error() {
        let mut tracker = DeviceStateTracker::default();
        tracker.set(DeviceState::Error);
        assert!(tracker.can_connect());
    }

    #[test]
    fn connect_refused_while_connecting_or_connected() {
        let mut tracker = DeviceStateTracker::default();
        tracker.set(DeviceState::Connecting);
        assert!(!tracker.can_connect());
        tracker.set(DeviceState::Connected);
        assert!(!tracker.can_connect());
        assert!(tracker.can_disconnect());
    }

    #[test]
    fn set_returns_previous_state() {
        let mut tracker = DeviceStateTracker::default();
        let previous = tracker.set(DeviceState::Connecting);
        assert_eq!(previous, DeviceState::Disconnected);
        assert_eq!(tracker.current(), DeviceState::Connecting);
    }
}
