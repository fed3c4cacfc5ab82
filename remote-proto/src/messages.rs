//! Typed payloads and message discriminators for the integration protocol.
//!
//! The envelope layer (`envelope`) carries payloads as raw `serde_json::Value`;
//! the structures here give each message a concrete shape. Entity attribute
//! maps stay opaque `Value`s throughout: the protocol engine never interprets
//! attribute semantics, it only relays them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::{DeviceState, DriverSetupState, SetupError, SetupEventType};

/// Version of the integration API implemented by this workspace.
pub const API_VERSION: &str = "0.9.2";

/// Request `msg` discriminators accepted from the remote.
pub mod request {
    pub const AUTH: &str = "auth";
    pub const GET_DRIVER_VERSION: &str = "get_driver_version";
    pub const GET_DRIVER_METADATA: &str = "get_driver_metadata";
    pub const GET_DEVICE_STATE: &str = "get_device_state";
    pub const GET_AVAILABLE_ENTITIES: &str = "get_available_entities";
    pub const SUBSCRIBE_EVENTS: &str = "subscribe_events";
    pub const UNSUBSCRIBE_EVENTS: &str = "unsubscribe_events";
    pub const GET_ENTITY_STATES: &str = "get_entity_states";
    pub const ENTITY_COMMAND: &str = "entity_command";
    pub const SETUP_DRIVER: &str = "setup_driver";
    pub const SET_DRIVER_USER_DATA: &str = "set_driver_user_data";
}

/// Response `msg` discriminators sent to the remote.
pub mod response {
    pub const AUTHENTICATION: &str = "authentication";
    pub const DRIVER_VERSION: &str = "driver_version";
    pub const DRIVER_METADATA: &str = "driver_metadata";
    pub const AVAILABLE_ENTITIES: &str = "available_entities";
    pub const ENTITY_STATES: &str = "entity_states";
    pub const RESULT: &str = "result";
}

/// Event `msg` discriminators, inbound and outbound.
pub mod event {
    // Inbound (remote -> driver).
    pub const ENTER_STANDBY: &str = "enter_standby";
    pub const EXIT_STANDBY: &str = "exit_standby";
    pub const CONNECT: &str = "connect";
    pub const DISCONNECT: &str = "disconnect";
    pub const ABORT_DRIVER_SETUP: &str = "abort_driver_setup";

    // Outbound (driver -> remote).
    pub const DEVICE_STATE: &str = "device_state";
    pub const DRIVER_SETUP_CHANGE: &str = "driver_setup_change";
    pub const ENTITY_CHANGE: &str = "entity_change";
    pub const ENTITY_REMOVED: &str = "entity_removed";
    pub const ENTITY_AVAILABLE: &str = "entity_available";
}

/// Static driver description returned verbatim by `get_driver_metadata`.
///
/// `name` and `description` are localized text maps keyed by language tag;
/// an `"en"` entry is the expected minimum. `setup_data_schema` is an opaque
/// JSON document the remote renders during the setup flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverMetadata {
    pub driver_id: String,
    pub name: std::collections::BTreeMap<String, String>,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<std::collections::BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_data_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

impl DriverMetadata {
    /// English driver name, falling back to the driver id.
    pub fn display_name(&self) -> &str {
        self.name
            .get("en")
            .map(String::as_str)
            .unwrap_or(&self.driver_id)
    }
}

/// Payload of the `driver_version` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverVersionInfo {
    pub name: String,
    pub version: VersionBlock,
}

/// API and driver version pair inside [`DriverVersionInfo`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionBlock {
    pub api: String,
    pub driver: String,
}

/// Entity-type filter attached to `get_available_entities`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

/// Payload of the `get_available_entities` request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailableEntitiesRequest {
    #[serde(default)]
    pub filter: Option<EntityFilter>,
}

/// Payload of the `available_entities` response.
///
/// The `filter` field is echoed back only when the request carried one; the
/// unfiltered response omits the field entirely. Both shapes are part of the
/// wire contract.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableEntitiesResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<EntityFilter>,
    pub available_entities: Vec<EntityDescription>,
}

/// One catalog entry as exposed through `available_entities`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDescription {
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub entity_type: String,
    pub attributes: Value,
}

/// One entity snapshot inside the `entity_states` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStateItem {
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub entity_type: String,
    pub attributes: Value,
}

/// Payload of `subscribe_events` and `unsubscribe_events`.
///
/// A missing id list means "all": on subscribe, every entity currently in the
/// catalog; on unsubscribe, every id currently subscribed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeEventsRequest {
    #[serde(default)]
    pub entity_ids: Option<Vec<String>>,
}

/// Payload of the `entity_command` request.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityCommandRequest {
    pub entity_id: String,
    pub cmd_id: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Payload of the `setup_driver` request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetupDriverRequest {
    #[serde(default)]
    pub setup_data: Value,
    #[serde(default)]
    pub reconfigure: Option<bool>,
}

/// Payload of the `set_driver_user_data` request.
///
/// Exactly one of `input_values` or `confirm` is expected; the engine relays
/// whatever arrived without validating exclusivity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetDriverUserDataRequest {
    #[serde(default)]
    pub input_values: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    pub confirm: Option<bool>,
}

/// Payload of the outbound `device_state` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStateEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub state: DeviceState,
}

/// Payload of the outbound `driver_setup_change` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSetupChange {
    pub event_type: SetupEventType,
    pub state: DriverSetupState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SetupError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_user_action: Option<Value>,
}

/// Payload of the outbound `entity_change` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityChangeEvent {
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub entity_type: String,
    pub attributes: Value,
}

/// Payload of the outbound `entity_available` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityAvailableEvent {
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub entity_type: String,
    pub attributes: Value,
}

/// Payload of the outbound `entity_removed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRemovedEvent {
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub entity_type: String,
}
