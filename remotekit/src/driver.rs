//! The driver runtime: builder, wiring and lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use remote_core::{DeviceHandler, DriverHandle, Integration};
use remote_proto::DriverMetadata;
use ws_gateway::GatewayServer;

use crate::config::DriverConfig;
use crate::error::{DriverError, Result};

/// Builder for [`IntegrationDriver`].
///
/// # Example
///
/// ```rust,ignore
/// let driver = IntegrationDriverBuilder::new()
///     .metadata(metadata)
///     .handler(Arc::new(MyHandler::new()))
///     .config(DriverConfig::default())
///     .build()
///     .await?;
///
/// let handle = driver.handle();
/// handle.add_entity(Arc::new(MyLight::new("light-1")))?;
/// ```
#[derive(Default)]
pub struct IntegrationDriverBuilder {
    metadata: Option<DriverMetadata>,
    handler: Option<Arc<dyn DeviceHandler>>,
    config: DriverConfig,
}

impl IntegrationDriverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver identity returned through `get_driver_metadata`.
    pub fn metadata(mut self, metadata: DriverMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The device collaborator receiving setup and connection callbacks.
    pub fn handler(mut self, handler: Arc<dyn DeviceHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate, spawn the engine and bind the gateway.
    pub async fn build(self) -> Result<IntegrationDriver> {
        let metadata = self
            .metadata
            .ok_or_else(|| DriverError::InvalidMetadata("metadata not set".into()))?;
        if metadata.driver_id.is_empty() {
            return Err(DriverError::InvalidMetadata("empty driver_id".into()));
        }
        if metadata.version.is_empty() {
            return Err(DriverError::InvalidMetadata("empty version".into()));
        }
        let handler = self.handler.ok_or(DriverError::MissingHandler)?;

        IntegrationDriver::start(metadata, handler, self.config).await
    }
}

/// A running integration driver: engine task plus WebSocket gateway.
///
/// Dropping the driver leaves the background tasks running detached; call
/// [`IntegrationDriver::shutdown`] for an orderly stop.
pub struct IntegrationDriver {
    handle: DriverHandle,
    gateway: Option<GatewayServer>,
    engine_task: Option<tokio::task::JoinHandle<()>>,
    forward_task: Option<tokio::task::JoinHandle<()>>,
}

impl IntegrationDriver {
    async fn start(
        metadata: DriverMetadata,
        handler: Arc<dyn DeviceHandler>,
        config: DriverConfig,
    ) -> Result<Self> {
        let driver_id = metadata.driver_id.clone();
        let (handle, engine_task) = Integration::spawn(metadata, handler, config.core());

        let (gateway_tx, mut gateway_rx) = mpsc::unbounded_channel();
        let gateway = GatewayServer::start(config.gateway(), gateway_tx).await?;

        // Adapter task: gateway traffic becomes engine commands. Ends when
        // either side goes away.
        let forward_handle = handle.clone();
        let forward_task = tokio::spawn(async move {
            while let Some(event) = gateway_rx.recv().await {
                if forward_handle.gateway_event(event).is_err() {
                    debug!("engine gone, stopping gateway forwarder");
                    break;
                }
            }
        });

        info!(driver = %driver_id, addr = %gateway.local_addr(), "integration driver running");

        Ok(Self {
            handle,
            gateway: Some(gateway),
            engine_task: Some(engine_task),
            forward_task: Some(forward_task),
        })
    }

    /// Collaborator handle for entity lifecycle and state reporting.
    pub fn handle(&self) -> DriverHandle {
        self.handle.clone()
    }

    /// Address the WebSocket endpoint is bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.gateway.as_ref().map(GatewayServer::local_addr)
    }

    /// Stop the driver: close the gateway (and any session), then the
    /// engine task, in that order.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(gateway) = self.gateway.take() {
            gateway.shutdown().await?;
        }
        // The engine drains commands already queued before stopping.
        let _ = self.handle.shutdown();
        if let Some(task) = self.engine_task.take() {
            task.await
                .map_err(|err| DriverError::Shutdown(err.to_string()))?;
        }
        if let Some(task) = self.forward_task.take() {
            task.await
                .map_err(|err| DriverError::Shutdown(err.to_string()))?;
        }
        Ok(())
    }
}
