//! The entity catalog.

use std::sync::Arc;

use tracing::debug;

use remote_proto::messages::{EntityDescription, EntityStateItem};

use crate::entity::Entity;
use crate::error::{CoreError, Result};

/// Ordered collection of the entities this driver exposes.
///
/// Append-only except for explicit removal; registration order is preserved
/// and reflected in `available_entities` responses.
#[derive(Default)]
pub struct EntityCatalog {
    entries: Vec<Arc<dyn Entity>>,
}

impl EntityCatalog {
    /// Register an entity. Duplicate ids are rejected.
    pub fn add(&mut self, entity: Arc<dyn Entity>) -> Result<()> {
        let id = entity.entity_id();
        if self.entries.iter().any(|e| e.entity_id() == id) {
            return Err(CoreError::DuplicateEntity(id.to_string()));
        }
        debug!(entity = id, entity_type = entity.entity_type(), "entity registered");
        self.entries.push(entity);
        Ok(())
    }

    /// Remove an entity, returning it if it was present.
    pub fn remove_by_id(&mut self, entity_id: &str) -> Option<Arc<dyn Entity>> {
        let index = self
            .entries
            .iter()
            .position(|e| e.entity_id() == entity_id)?;
        Some(self.entries.remove(index))
    }

    /// Look up an entity by id.
    pub fn get(&self, entity_id: &str) -> Option<&Arc<dyn Entity>> {
        self.entries.iter().find(|e| e.entity_id() == entity_id)
    }

    /// Ids of all registered entities, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.entity_id())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the catalog, optionally restricted to one entity type.
    pub fn descriptions(&self, entity_type: Option<&str>) -> Vec<EntityDescription> {
        self.entries
            .iter()
            .filter(|e| entity_type.map_or(true, |t| e.entity_type() == t))
            .map(|e| EntityDescription {
                entity_id: e.entity_id().to_string(),
                device_id: e.device_id().map(str::to_string),
                entity_type: e.entity_type().to_string(),
                attributes: e.attributes(),
            })
            .collect()
    }

    /// Snapshot every entity's current state, as of this call.
    pub fn states(&self) -> Vec<EntityStateItem> {
        self.entries
            .iter()
            .map(|e| EntityStateItem {
                entity_id: e.entity_id().to_string(),
                device_id: e.device_id().map(str::to_string),
                entity_type: e.entity_type().to_string(),
                attributes: e.attributes(),
            })
            .collect()
    }
}
