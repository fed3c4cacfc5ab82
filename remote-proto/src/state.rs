//! Protocol state enumerations shared between the core and the wire.

use serde::{Deserialize, Serialize};

/// Connection state of the integrated device, as reported to the remote.
///
/// CONNECTING is transient: it is always followed by CONNECTED, ERROR or
/// DISCONNECTED once the device collaborator finishes its attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl DeviceState {
    /// Wire representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Disconnected => "DISCONNECTED",
            DeviceState::Connecting => "CONNECTING",
            DeviceState::Connected => "CONNECTED",
            DeviceState::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the multi-step driver setup flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverSetupState {
    Setup,
    WaitUserAction,
    Ok,
    Error,
}

impl DriverSetupState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverSetupState::Setup => "SETUP",
            DriverSetupState::WaitUserAction => "WAIT_USER_ACTION",
            DriverSetupState::Ok => "OK",
            DriverSetupState::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for DriverSetupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase tag attached to every `driver_setup_change` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupEventType {
    Start,
    Setup,
    Stop,
}

/// Error classification reported through `driver_setup_change` events.
///
/// Setup and user-data callbacks never fail through their request's own
/// response; failures surface out-of-band with one of these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupError {
    None,
    NotFound,
    ConnectionRefused,
    AuthorizationError,
    Timeout,
    Other,
}
