//! WebSocket gateway for remotekit integration drivers.
//!
//! This crate owns the transport side of the protocol and nothing else: it
//! upgrades `GET /ws`, runs one reader and one writer task per connection,
//! keeps the link alive with ping/pong, and hands decoded frames to the
//! protocol engine over a channel. All driver semantics (routing, state
//! machines, subscriptions) live upstream in `remotekit-core`.
//!
//! # Architecture
//!
//! - [`GatewayServer`]: binds the listener and serves the `/ws` route. At
//!   most one session is active; concurrent upgrades are refused with `503`.
//! - [`SessionHandle`]: cheap clone handed to the engine for enqueueing
//!   outbound frames. The per-session queue is the only path to the wire.
//! - [`GatewayEvent`]: inbound traffic and lifecycle notifications
//!   (`SessionOpened` / `Frame` / `SessionClosed`), delivered in order on an
//!   unbounded channel.
//!
//! # Keepalive and teardown
//!
//! The writer pings every 0.9 × `pong_wait`; the reader's deadline resets on
//! each pong. A missed deadline, a failed read, or a failed write flips a
//! shared shutdown signal watched by both tasks, so closing one direction
//! always closes the other and the connection is torn down exactly once.
//!
//! # Example
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use ws_gateway::{GatewayConfig, GatewayEvent, GatewayServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, mut rx) = mpsc::unbounded_channel::<GatewayEvent>();
//!     let server = GatewayServer::start(GatewayConfig::default(), tx).await?;
//!     println!("listening on {}", server.local_addr());
//!
//!     while let Some(event) = rx.recv().await {
//!         match event {
//!             GatewayEvent::SessionOpened(handle) => println!("session {}", handle.id()),
//!             GatewayEvent::Frame { frame, .. } => println!("frame: {frame:?}"),
//!             GatewayEvent::SessionClosed(id) => println!("closed {id}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
mod server;
mod session;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use server::{ws_filter, GatewayServer};
pub use session::{GatewayEvent, SessionHandle};
