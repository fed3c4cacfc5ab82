//! The driver-setup state relay.
//!
//! The setup flow is driven entirely by collaborator calls; the engine does
//! not validate event-type ordering (START → SETUP → STOP), it relays. The
//! one rule it enforces absolutely: a present `require_user_action` payload
//! forces the reported state to WAIT_USER_ACTION, whatever the caller said.

use serde_json::Value;
use tracing::debug;

use remote_proto::messages::DriverSetupChange;
use remote_proto::{DriverSetupState, SetupError, SetupEventType};

/// Relay for `driver_setup_change` notifications.
///
/// After the remote aborts the setup flow, collaborator state changes are
/// considered stale and suppressed until the next `setup_driver` request
/// re-arms the relay.
#[derive(Debug, Default)]
pub struct SetupFlow {
    aborted: bool,
}

impl SetupFlow {
    /// Turn a collaborator state report into an outbound change payload.
    ///
    /// Returns `None` when the flow has been aborted and the report is
    /// stale.
    pub fn apply(
        &mut self,
        event_type: SetupEventType,
        state: DriverSetupState,
        error: Option<SetupError>,
        require_user_action: Option<Value>,
    ) -> Option<DriverSetupChange> {
        if self.aborted {
            debug!(?event_type, ?state, "setup aborted, suppressing state change");
            return None;
        }

        let effective_state = if require_user_action.is_some() {
            DriverSetupState::WaitUserAction
        } else {
            state
        };

        Some(DriverSetupChange {
            event_type,
            state: effective_state,
            error,
            require_user_action,
        })
    }

    /// The remote aborted the flow; suppress further reports.
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    /// A new `setup_driver` request arrived; reports flow again.
    pub fn arm(&mut self) {
        self.aborted = false;
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}
