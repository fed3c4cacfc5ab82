//! The entity subscription registry.
//!
//! Tracks which entity ids the remote wants change notifications for. A
//! subscribe request with no explicit id list materializes the ids of every
//! entity known *at call time* — there is no wildcard: entities registered
//! afterwards are not retroactively subscribed.

use tracing::debug;

/// Set of subscribed entity ids.
///
/// Ids are unique; insertion order is preserved, matching how the catalog
/// was walked when the subscription was made.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    ids: Vec<String>,
}

impl SubscriptionRegistry {
    /// Add one id. Idempotent; returns `true` when newly added.
    pub fn subscribe(&mut self, entity_id: &str) -> bool {
        if self.contains(entity_id) {
            return false;
        }
        self.ids.push(entity_id.to_string());
        true
    }

    /// Remove one id. Returns `true` when it was present.
    pub fn unsubscribe(&mut self, entity_id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| id != entity_id);
        self.ids.len() != before
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.ids.iter().any(|id| id == entity_id)
    }

    /// Subscribed ids in insertion order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Apply a `subscribe_events` request against the current catalog.
    ///
    /// Every catalog id matching the request (all of them when no explicit
    /// list was sent) is added.
    pub fn apply_subscribe<'a>(
        &mut self,
        catalog_ids: impl Iterator<Item = &'a str>,
        requested: Option<&[String]>,
    ) {
        for id in catalog_ids {
            let wanted = requested.map_or(true, |list| list.iter().any(|r| r == id));
            if wanted && self.subscribe(id) {
                debug!(entity = id, "subscribed");
            }
        }
    }

    /// Apply an `unsubscribe_events` request.
    ///
    /// No explicit list clears the whole set.
    pub fn apply_unsubscribe(&mut self, requested: Option<&[String]>) {
        match requested {
            None => {
                debug!(count = self.ids.len(), "unsubscribing all");
                self.ids.clear();
            }
            Some(list) => {
                self.ids.retain(|id| !list.contains(id));
            }
        }
    }
}
