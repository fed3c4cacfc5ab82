//! The entity capability contract.
//!
//! Entities are opaque to the protocol engine. Whatever a device integration
//! exposes (a light, a sensor, a media player), the engine only ever reads
//! its id, device id, type tag and attribute map for serialization and
//! filtering, and submits commands through [`Entity::handle_command`]. It
//! never interprets attribute contents.

use async_trait::async_trait;
use serde_json::Value;

/// One addressable, controllable item exposed to the remote.
///
/// Implementations live in device-integration crates. Attribute maps are
/// returned as JSON values so each integration is free to shape them; the
/// engine relays them verbatim.
#[async_trait]
pub trait Entity: Send + Sync {
    /// Unique entity id within this driver.
    fn entity_id(&self) -> &str;

    /// Id of the physical device this entity belongs to, if any.
    fn device_id(&self) -> Option<&str> {
        None
    }

    /// Type tag (`"light"`, `"sensor"`, `"media_player"`, ...) used for
    /// catalog filtering. Free-form from the engine's point of view.
    fn entity_type(&self) -> &str;

    /// Current attribute map, serialized for the wire.
    fn attributes(&self) -> Value;

    /// Execute a command against this entity.
    ///
    /// Returns `None` when the entity handles no commands at all (the engine
    /// answers 404), or `Some(code)` with the handler's own result code. The
    /// engine logs that code but reports plain success to the remote as long
    /// as the entity exists.
    async fn handle_command(&self, cmd_id: &str, params: Option<&Value>) -> Option<u16> {
        let _ = (cmd_id, params);
        None
    }
}
