//! Commands accepted by the engine task, and the handle that sends them.
//!
//! Every mutation of engine state — whether triggered by the remote or by a
//! device collaborator's background work — travels through one command
//! channel drained by a single task. That channel is the synchronization
//! discipline: there are no locks around the catalog, the subscription set
//! or the state machines, because only the engine task touches them.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use remote_proto::{DeviceState, DriverSetupState, SetupError, SetupEventType};
use ws_gateway::GatewayEvent;

use crate::entity::Entity;
use crate::error::{CoreError, Result};

/// A unit of work for the engine task.
pub enum CoreCommand {
    /// Inbound traffic or session lifecycle from the gateway.
    Gateway(GatewayEvent),
    /// Register an entity in the catalog.
    AddEntity(Arc<dyn Entity>),
    /// Remove an entity by id.
    RemoveEntity(String),
    /// The collaborator reports a device connection state.
    SetDeviceState(DeviceState),
    /// The collaborator reports driver setup progress.
    SetDriverSetupState {
        event_type: SetupEventType,
        state: DriverSetupState,
        error: Option<SetupError>,
        require_user_action: Option<Value>,
    },
    /// An entity's attributes changed; notify the remote if subscribed.
    EntityChange(Arc<dyn Entity>),
    /// Stop the engine task.
    Shutdown,
}

/// Cloneable handle to the engine task.
///
/// This is the collaborator-facing API: device integrations keep one and
/// call it from any task, at any time. Sends never block; they fail only
/// when the engine is gone.
#[derive(Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<CoreCommand>,
}

impl DriverHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<CoreCommand>) -> Self {
        Self { tx }
    }

    fn send(&self, command: CoreCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| CoreError::ChannelClosed)
    }

    /// Register an entity. Emits `entity_available` to the remote.
    pub fn add_entity(&self, entity: Arc<dyn Entity>) -> Result<()> {
        self.send(CoreCommand::AddEntity(entity))
    }

    /// Remove an entity. Emits `entity_removed` and drops any subscription.
    pub fn remove_entity_by_id(&self, entity_id: impl Into<String>) -> Result<()> {
        self.send(CoreCommand::RemoveEntity(entity_id.into()))
    }

    /// Report the device connection state. Always re-broadcast to the
    /// remote, even when unchanged.
    pub fn set_device_state(&self, state: DeviceState) -> Result<()> {
        self.send(CoreCommand::SetDeviceState(state))
    }

    /// Report driver setup progress.
    ///
    /// A present `require_user_action` payload forces the effective state to
    /// WAIT_USER_ACTION regardless of `state`.
    pub fn set_driver_setup_state(
        &self,
        event_type: SetupEventType,
        state: DriverSetupState,
        error: Option<SetupError>,
        require_user_action: Option<Value>,
    ) -> Result<()> {
        self.send(CoreCommand::SetDriverSetupState {
            event_type,
            state,
            error,
            require_user_action,
        })
    }

    /// Notify the remote of an entity attribute change.
    ///
    /// Delivered only while the entity is subscribed and the session is not
    /// in standby; otherwise silently dropped.
    pub fn send_entity_change_event(&self, entity: Arc<dyn Entity>) -> Result<()> {
        self.send(CoreCommand::EntityChange(entity))
    }

    /// Forward a gateway event. Wired up by the driver runtime.
    pub fn gateway_event(&self, event: GatewayEvent) -> Result<()> {
        self.send(CoreCommand::Gateway(event))
    }

    /// Ask the engine task to stop.
    pub fn shutdown(&self) -> Result<()> {
        self.send(CoreCommand::Shutdown)
    }
}
