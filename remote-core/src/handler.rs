//! The device-collaborator contract.
//!
//! A device integration registers one [`DeviceHandler`]. The engine calls it
//! for driver setup, user-data submission and connect/disconnect requests;
//! the handler calls back through the [`DriverHandle`] it receives
//! (`set_device_state`, `set_driver_setup_state`, entity lifecycle) whenever
//! its own background work produces results. Neither side blocks the other:
//! all three callbacks run on spawned tasks, off the request-handling path.

use async_trait::async_trait;

use remote_proto::messages::{SetDriverUserDataRequest, SetupDriverRequest};

use crate::command::DriverHandle;

/// Connect/disconnect request forwarded verbatim from the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connect,
    Disconnect,
}

/// Callbacks a device integration must implement.
///
/// Outcomes are reported out-of-band: `setup` and `user_data` failures go
/// through `driver.set_driver_setup_state(...)` with a setup error code,
/// never through the request's own response. Connection results go through
/// `driver.set_device_state(...)`.
#[async_trait]
pub trait DeviceHandler: Send + Sync {
    /// Begin (or restart) the driver setup flow with the supplied data.
    async fn setup(&self, driver: DriverHandle, request: SetupDriverRequest);

    /// The remote asked the driver to connect to or disconnect from its
    /// device. Own the attempt and report the resulting state.
    async fn connection_event(&self, driver: DriverHandle, event: ConnectionEvent);

    /// User input collected during setup, or a confirmation click.
    async fn user_data(&self, driver: DriverHandle, request: SetDriverUserDataRequest);
}
