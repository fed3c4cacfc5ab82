//! The integration engine task.
//!
//! One task owns all mutable protocol state — catalog, subscriptions,
//! device and setup state, the active session — and drains the command
//! queue. Request and event dispatch live in the `router` and `events`
//! modules as further impls on [`Integration`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use remote_proto::messages::{event, DeviceStateEvent, EntityAvailableEvent, EntityRemovedEvent};
use remote_proto::{DriverMetadata, OutboundEvent, OutboundFrame, ResponseMessage};
use ws_gateway::{GatewayEvent, SessionHandle};

use crate::catalog::EntityCatalog;
use crate::command::{CoreCommand, DriverHandle};
use crate::device_state::DeviceStateTracker;
use crate::handler::DeviceHandler;
use crate::setup::SetupFlow;
use crate::subscriptions::SubscriptionRegistry;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Device id reported in `device_state` events, when the driver
    /// represents a single device.
    pub device_id: Option<String>,
    /// Pause between announcing CONNECTING and starting the collaborator's
    /// connect attempt, so the announcement reaches the wire before the
    /// attempt's own state changes can race it.
    pub connect_announce_delay: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            device_id: None,
            connect_announce_delay: Duration::from_secs(1),
        }
    }
}

/// The root aggregate: all protocol state, owned by one task.
pub struct Integration {
    pub(crate) metadata: DriverMetadata,
    pub(crate) config: CoreConfig,
    pub(crate) handler: Arc<dyn DeviceHandler>,
    pub(crate) handle: DriverHandle,
    pub(crate) catalog: EntityCatalog,
    pub(crate) subscriptions: SubscriptionRegistry,
    pub(crate) device_state: DeviceStateTracker,
    pub(crate) setup: SetupFlow,
    pub(crate) session: Option<SessionHandle>,
    pub(crate) standby: bool,
}

impl Integration {
    /// Spawn the engine task.
    ///
    /// Returns the collaborator handle and the task's join handle. The task
    /// runs until [`DriverHandle::shutdown`] is called or every handle is
    /// dropped.
    pub fn spawn(
        metadata: DriverMetadata,
        handler: Arc<dyn DeviceHandler>,
        config: CoreConfig,
    ) -> (DriverHandle, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = DriverHandle::new(tx);
        let engine = Integration {
            metadata,
            config,
            handler,
            handle: handle.clone(),
            catalog: EntityCatalog::default(),
            subscriptions: SubscriptionRegistry::default(),
            device_state: DeviceStateTracker::default(),
            setup: SetupFlow::default(),
            session: None,
            standby: false,
        };
        let task = tokio::spawn(engine.run(rx));
        (handle, task)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<CoreCommand>) {
        info!(driver = %self.metadata.driver_id, "integration engine started");
        while let Some(command) = rx.recv().await {
            match command {
                CoreCommand::Shutdown => break,
                command => self.handle_command(command).await,
            }
        }
        info!(driver = %self.metadata.driver_id, "integration engine stopped");
    }

    async fn handle_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::Gateway(event) => self.handle_gateway_event(event).await,
            CoreCommand::AddEntity(entity) => self.add_entity(entity),
            CoreCommand::RemoveEntity(entity_id) => self.remove_entity(&entity_id),
            CoreCommand::SetDeviceState(state) => {
                self.device_state.set(state);
                self.announce_device_state();
            }
            CoreCommand::SetDriverSetupState {
                event_type,
                state,
                error,
                require_user_action,
            } => {
                if let Some(change) =
                    self.setup
                        .apply(event_type, state, error, require_user_action)
                {
                    self.emit_event(event::DRIVER_SETUP_CHANGE, to_payload(&change));
                }
            }
            CoreCommand::EntityChange(entity) => self.entity_change(entity),
            // Shutdown is intercepted in run().
            CoreCommand::Shutdown => {}
        }
    }

    async fn handle_gateway_event(&mut self, gw_event: GatewayEvent) {
        match gw_event {
            GatewayEvent::SessionOpened(handle) => {
                if self.session.is_some() {
                    warn!(session = %handle.id(), "replacing existing session handle");
                }
                self.standby = false;
                self.session = Some(handle);
            }
            GatewayEvent::SessionClosed(id) => {
                if self.session.as_ref().map(SessionHandle::id) == Some(id) {
                    self.session = None;
                    self.standby = false;
                }
            }
            GatewayEvent::Frame { session_id, frame } => {
                if self.session.as_ref().map(SessionHandle::id) != Some(session_id) {
                    debug!(session = %session_id, "dropping frame from retired session");
                    return;
                }
                match frame {
                    remote_proto::InboundFrame::Request(req) => self.handle_request(req).await,
                    remote_proto::InboundFrame::Event(ev) => self.handle_remote_event(ev),
                }
            }
        }
    }

    fn add_entity(&mut self, entity: Arc<dyn crate::entity::Entity>) {
        let available = EntityAvailableEvent {
            entity_id: entity.entity_id().to_string(),
            device_id: entity.device_id().map(str::to_string),
            entity_type: entity.entity_type().to_string(),
            attributes: entity.attributes(),
        };
        match self.catalog.add(entity) {
            Ok(()) => self.emit_event(event::ENTITY_AVAILABLE, to_payload(&available)),
            Err(err) => warn!(error = %err, "rejecting entity"),
        }
    }

    fn remove_entity(&mut self, entity_id: &str) {
        match self.catalog.remove_by_id(entity_id) {
            Some(entity) => {
                self.subscriptions.unsubscribe(entity_id);
                let removed = EntityRemovedEvent {
                    entity_id: entity.entity_id().to_string(),
                    device_id: entity.device_id().map(str::to_string),
                    entity_type: entity.entity_type().to_string(),
                };
                self.emit_event(event::ENTITY_REMOVED, to_payload(&removed));
            }
            None => debug!(entity = entity_id, "remove for unknown entity"),
        }
    }

    fn entity_change(&mut self, entity: Arc<dyn crate::entity::Entity>) {
        let entity_id = entity.entity_id();
        if !self.subscriptions.contains(entity_id) {
            debug!(entity = entity_id, "not subscribed, dropping entity_change");
            return;
        }
        let change = remote_proto::messages::EntityChangeEvent {
            entity_id: entity_id.to_string(),
            device_id: entity.device_id().map(str::to_string),
            entity_type: entity.entity_type().to_string(),
            attributes: entity.attributes(),
        };
        self.emit_event(event::ENTITY_CHANGE, to_payload(&change));
    }

    /// Broadcast the current device state. Standby-gated like every event,
    /// but never filtered by the subscription registry: device state is not
    /// an entity.
    pub(crate) fn announce_device_state(&mut self) {
        let payload = DeviceStateEvent {
            device_id: self.config.device_id.clone(),
            state: self.device_state.current(),
        };
        self.emit_event(event::DEVICE_STATE, to_payload(&payload));
    }

    /// Queue an event for the remote, subject to the standby gate.
    ///
    /// Suppressed events are constructed, logged and discarded — never
    /// queued, never retried.
    pub(crate) fn emit_event(&mut self, msg: &str, msg_data: Value) {
        if self.standby {
            debug!(msg, "standby active, discarding event");
            return;
        }
        let Some(session) = &self.session else {
            debug!(msg, "no active session, discarding event");
            return;
        };
        session.enqueue(OutboundFrame::Event(OutboundEvent::new(msg, msg_data)));
    }

    /// Queue a response for the remote. Responses bypass the standby gate.
    pub(crate) fn send_response(&mut self, response: ResponseMessage) {
        let Some(session) = &self.session else {
            debug!(msg = %response.msg, "no active session, dropping response");
            return;
        };
        session.enqueue(OutboundFrame::Response(response));
    }
}

/// Serialize an internal payload, logging the (programming-error class)
/// failure instead of propagating it.
pub(crate) fn to_payload<T: serde::Serialize>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize event payload");
            Value::Null
        }
    }
}
