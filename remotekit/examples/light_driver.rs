//! Minimal integration driver exposing one dimmable light.
//!
//! Run with `cargo run --example light_driver`, then connect a remote (or
//! `websocat ws://127.0.0.1:9090/ws`) and poke it with protocol frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use remotekit::{
    ConnectionEvent, DeviceHandler, DeviceState, DriverConfig, DriverHandle, DriverMetadata,
    DriverSetupState, Entity, IntegrationDriverBuilder, SetDriverUserDataRequest,
    SetupDriverRequest, SetupEventType,
};

/// A light that lives entirely in memory.
struct DemoLight {
    on: AtomicBool,
}

#[async_trait]
impl Entity for DemoLight {
    fn entity_id(&self) -> &str {
        "demo-light"
    }

    fn device_id(&self) -> Option<&str> {
        Some("demo-device")
    }

    fn entity_type(&self) -> &str {
        "light"
    }

    fn attributes(&self) -> Value {
        json!({"state": if self.on.load(Ordering::Relaxed) { "ON" } else { "OFF" }})
    }

    async fn handle_command(&self, cmd_id: &str, _params: Option<&Value>) -> Option<u16> {
        match cmd_id {
            "on" => {
                self.on.store(true, Ordering::Relaxed);
                Some(200)
            }
            "off" => {
                self.on.store(false, Ordering::Relaxed);
                Some(200)
            }
            _ => Some(400),
        }
    }
}

/// Device handler with an instant "device": setup always succeeds and
/// connecting is immediate.
struct DemoHandler;

#[async_trait]
impl DeviceHandler for DemoHandler {
    async fn setup(&self, driver: DriverHandle, request: SetupDriverRequest) {
        info!(data = %request.setup_data, "setup requested");
        let _ = driver.set_driver_setup_state(
            SetupEventType::Stop,
            DriverSetupState::Ok,
            None,
            None,
        );
    }

    async fn connection_event(&self, driver: DriverHandle, event: ConnectionEvent) {
        let state = match event {
            ConnectionEvent::Connect => DeviceState::Connected,
            ConnectionEvent::Disconnect => DeviceState::Disconnected,
        };
        let _ = driver.set_device_state(state);
    }

    async fn user_data(&self, _driver: DriverHandle, request: SetDriverUserDataRequest) {
        info!(confirm = ?request.confirm, "user data received");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let metadata = DriverMetadata {
        driver_id: "demo_light".into(),
        name: [("en".to_string(), "Demo Light".to_string())].into(),
        version: "0.1.0".into(),
        icon: Some("custom:light".into()),
        description: Some([("en".to_string(), "One in-memory light".to_string())].into()),
        setup_data_schema: None,
        release_date: None,
    };

    let driver = IntegrationDriverBuilder::new()
        .metadata(metadata)
        .handler(Arc::new(DemoHandler))
        .config(DriverConfig {
            device_id: Some("demo-device".into()),
            ..Default::default()
        })
        .build()
        .await?;

    let handle = driver.handle();
    handle.add_entity(Arc::new(DemoLight {
        on: AtomicBool::new(false),
    }))?;

    info!(addr = ?driver.local_addr(), "demo driver ready, ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    driver.shutdown().await?;
    Ok(())
}
