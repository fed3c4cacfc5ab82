//! The WebSocket endpoint and the single-session invariant.
//!
//! The gateway serves exactly one route, `GET /ws`, and upgrades it to the
//! integration protocol. Only one remote session is serviced at a time; a
//! second upgrade attempt is refused with `503 Service Unavailable` while the
//! first is alive, rather than letting two sessions race on shared state.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn};
use uuid::Uuid;
use warp::Filter;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::session::{self, GatewayEvent};

/// Holder of the one active session, if any.
#[derive(Clone, Default)]
pub(crate) struct SessionSlot {
    inner: Arc<Mutex<Option<ActiveSession>>>,
}

struct ActiveSession {
    id: Uuid,
    shutdown: Option<Arc<watch::Sender<bool>>>,
}

impl SessionSlot {
    /// Claim the slot for a new session. Returns `None` while occupied.
    fn try_claim(&self) -> Option<ClaimGuard> {
        let mut slot = self.inner.lock();
        if slot.is_some() {
            return None;
        }
        let id = Uuid::new_v4();
        *slot = Some(ActiveSession { id, shutdown: None });
        Some(ClaimGuard {
            slot: self.clone(),
            id,
        })
    }

    fn attach_shutdown(&self, id: Uuid, shutdown: Arc<watch::Sender<bool>>) {
        let mut slot = self.inner.lock();
        if let Some(active) = slot.as_mut() {
            if active.id == id {
                active.shutdown = Some(shutdown);
            }
        }
    }

    fn release(&self, id: Uuid) {
        let mut slot = self.inner.lock();
        if matches!(slot.as_ref(), Some(active) if active.id == id) {
            *slot = None;
        }
    }

    /// Ask the active session, if any, to tear down its tasks.
    fn signal_shutdown(&self) {
        let slot = self.inner.lock();
        if let Some(ActiveSession {
            shutdown: Some(shutdown),
            ..
        }) = slot.as_ref()
        {
            shutdown.send_replace(true);
        }
    }
}

/// RAII claim on the session slot.
///
/// Held for the lifetime of the session future; dropping it releases the
/// slot, including the case where the upgrade never completes and the
/// session future is discarded unrun.
pub(crate) struct ClaimGuard {
    slot: SessionSlot,
    id: Uuid,
}

impl ClaimGuard {
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn attach_shutdown(&self, shutdown: Arc<watch::Sender<bool>>) {
        self.slot.attach_shutdown(self.id, shutdown);
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.slot.release(self.id);
    }
}

fn ws_route(
    config: GatewayConfig,
    events: mpsc::UnboundedSender<GatewayEvent>,
    slot: SessionSlot,
) -> impl Filter<Extract = (Box<dyn warp::Reply>,), Error = warp::Rejection> + Clone {
    warp::path("ws")
        .and(warp::path::end())
        .and(warp::ws())
        .map(move |ws: warp::ws::Ws| -> Box<dyn warp::Reply> {
            let Some(claim) = slot.try_claim() else {
                warn!("refusing upgrade, a session is already active");
                return Box::new(warp::http::StatusCode::SERVICE_UNAVAILABLE);
            };
            let ws = ws
                .max_message_size(config.max_frame_size)
                .max_frame_size(config.max_frame_size);
            let config = config.clone();
            let events = events.clone();
            Box::new(ws.on_upgrade(move |socket| {
                session::run_session(socket, claim, config, events)
            }))
        })
}

/// Build the `/ws` filter with a fresh session slot.
///
/// This is the unit-testing seam: `warp::test::ws()` drives the returned
/// filter without binding a port. [`GatewayServer::start`] is the production
/// entry point.
pub fn ws_filter(
    config: GatewayConfig,
    events: mpsc::UnboundedSender<GatewayEvent>,
) -> impl Filter<Extract = (Box<dyn warp::Reply>,), Error = warp::Rejection> + Clone {
    ws_route(config, events, SessionSlot::default())
}

/// Running WebSocket gateway bound to a local port.
pub struct GatewayServer {
    local_addr: SocketAddr,
    slot: SessionSlot,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl GatewayServer {
    /// Bind the listener and start serving the `/ws` route.
    ///
    /// Decoded inbound frames and session lifecycle notifications are
    /// delivered on `events` in arrival order.
    pub async fn start(
        config: GatewayConfig,
        events: mpsc::UnboundedSender<GatewayEvent>,
    ) -> Result<Self> {
        let slot = SessionSlot::default();
        let route = ws_route(config.clone(), events, slot.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
        let (local_addr, server) = warp::serve(route)
            .try_bind_with_graceful_shutdown(addr, async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|err| GatewayError::Bind(err.to_string()))?;

        let server_handle = tokio::spawn(server);
        info!(%local_addr, "gateway listening");

        Ok(Self {
            local_addr,
            slot,
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    /// Address the gateway is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop the gateway: close the active session, then the listener.
    pub async fn shutdown(mut self) -> Result<()> {
        self.slot.signal_shutdown();
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|err| GatewayError::Shutdown(err.to_string()))?;
        }
        Ok(())
    }
}
