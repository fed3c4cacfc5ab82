//! Protocol engine for remotekit integration drivers.
//!
//! This crate implements the driver side of the integration protocol on top
//! of `remotekit-gateway`'s transport: request and event routing, the
//! device-connection and driver-setup state machines, the entity catalog and
//! the subscription registry that gates outbound change notifications.
//!
//! # Ownership model
//!
//! All mutable state lives in one [`Integration`] value owned by a single
//! spawned task. Both the remote's traffic (via gateway events) and device
//! collaborator callbacks (via [`DriverHandle`]) are funneled through one
//! command queue, so no locking discipline is needed around the catalog or
//! subscription set: the queue is the discipline.
//!
//! # Extension points
//!
//! - [`Entity`]: the capability contract device integrations implement per
//!   controllable item. The engine reads {id, device id, type, attributes}
//!   and submits commands; attribute semantics stay opaque.
//! - [`DeviceHandler`]: the collaborator contract for setup, user data and
//!   connect/disconnect handling. All callbacks run off the
//!   request-handling path; real outcomes flow back through the
//!   [`DriverHandle`].

pub mod catalog;
pub mod command;
pub mod device_state;
pub mod entity;
mod events;
pub mod error;
pub mod handler;
pub mod integration;
mod router;
pub mod setup;
pub mod subscriptions;

pub use catalog::EntityCatalog;
pub use command::{CoreCommand, DriverHandle};
pub use device_state::DeviceStateTracker;
pub use entity::Entity;
pub use error::{CoreError, Result};
pub use handler::{ConnectionEvent, DeviceHandler};
pub use integration::{CoreConfig, Integration};
pub use setup::SetupFlow;
pub use subscriptions::SubscriptionRegistry;
