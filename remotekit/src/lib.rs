//! SDK for building integration drivers for a smart remote controller.
//!
//! A driver exposes a catalog of controllable entities over one long-lived
//! WebSocket connection: the remote browses the catalog, subscribes to
//! attribute changes, and relays user commands; the driver streams state
//! changes back and bridges everything to the actual device integration.
//!
//! This crate is the public face of the workspace. It wires the protocol
//! engine (`remotekit-core`) to the transport (`remotekit-gateway`) and
//! re-exports everything a device integration needs:
//!
//! - [`IntegrationDriverBuilder`] / [`IntegrationDriver`]: construct and run
//!   a driver.
//! - [`DriverHandle`]: the collaborator API — register entities, report
//!   device and setup state, push entity changes. Cloneable, callable from
//!   any task.
//! - [`Entity`] and [`DeviceHandler`]: the two traits an integration
//!   implements.
//!
//! # Minimal driver
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use remotekit::{DriverConfig, DriverMetadata, IntegrationDriverBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metadata = DriverMetadata {
//!         driver_id: "my_driver".into(),
//!         name: [("en".to_string(), "My Driver".to_string())].into(),
//!         version: "0.1.0".into(),
//!         icon: None,
//!         description: None,
//!         setup_data_schema: None,
//!         release_date: None,
//!     };
//!
//!     let driver = IntegrationDriverBuilder::new()
//!         .metadata(metadata)
//!         .handler(Arc::new(MyHandler::default()))
//!         .config(DriverConfig::default())
//!         .build()
//!         .await?;
//!
//!     let handle = driver.handle();
//!     handle.add_entity(Arc::new(MyLight::new("light-1")))?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     driver.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod driver;
mod error;

pub use config::DriverConfig;
pub use driver::{IntegrationDriver, IntegrationDriverBuilder};
pub use error::{DriverError, Result};

pub use remote_core::{
    ConnectionEvent, DeviceHandler, DriverHandle, Entity,
};
pub use remote_proto::messages::{SetDriverUserDataRequest, SetupDriverRequest};
pub use remote_proto::{
    DeviceState, DriverMetadata, DriverSetupState, SetupError, SetupEventType, API_VERSION,
};
