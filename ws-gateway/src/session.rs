//! One remote session: paired reader and writer tasks over an upgraded
//! WebSocket connection.
//!
//! The writer owns the sink half and is the only place frames touch the wire;
//! everything upstream funnels through the session's outbound queue. The
//! reader decodes inbound frames and forwards them to the engine. Either task
//! failing flips a shared shutdown signal that promptly terminates the other,
//! so the physical connection is closed exactly once and no task is orphaned.

use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

use remote_proto::{InboundFrame, OutboundFrame, ResponseMessage};

use crate::config::GatewayConfig;
use crate::server::ClaimGuard;

/// Inbound traffic and lifecycle notifications, in arrival order.
///
/// `SessionOpened` is always delivered before any `Frame` of that session,
/// and `SessionClosed` after the last one.
#[derive(Debug)]
pub enum GatewayEvent {
    /// A remote connected and the handshake completed.
    SessionOpened(SessionHandle),
    /// A decoded frame from the active session.
    Frame {
        session_id: Uuid,
        frame: InboundFrame,
    },
    /// The session's tasks have terminated and the connection is gone.
    SessionClosed(Uuid),
}

/// Cheap handle for enqueueing outbound frames on a session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    outbound: mpsc::Sender<OutboundFrame>,
}

impl SessionHandle {
    /// Create a handle around an outbound queue sender.
    ///
    /// Exposed so engine tests can stand in for a live connection.
    pub fn new(id: Uuid, outbound: mpsc::Sender<OutboundFrame>) -> Self {
        Self { id, outbound }
    }

    /// Session identifier, used to correlate lifecycle events.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a frame for delivery.
    ///
    /// The queue is the sole serialization point for writes. There is no
    /// back-pressure: a full queue drops the frame and logs it, a closed
    /// queue means the session is already tearing down.
    pub fn enqueue(&self, frame: OutboundFrame) {
        match self.outbound.try_send(frame) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(frame)) => {
                warn!(session = %self.id, msg = frame.msg(), "outbound queue full, dropping frame");
            }
            Err(mpsc::error::TrySendError::Closed(frame)) => {
                debug!(session = %self.id, msg = frame.msg(), "session closed, dropping frame");
            }
        }
    }

    /// Whether the session's outbound queue has been torn down.
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// Drive one upgraded connection until either direction fails.
///
/// Holds the session-slot claim for its whole lifetime; the claim's drop
/// releases the slot whatever way the session ends.
pub(crate) async fn run_session(
    socket: WebSocket,
    claim: ClaimGuard,
    config: GatewayConfig,
    events: mpsc::UnboundedSender<GatewayEvent>,
) {
    let session_id = claim.id();
    info!(session = %session_id, "remote connected");

    let (sink, stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel(config.message_buffer_size);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown = Arc::new(shutdown_tx);
    claim.attach_shutdown(shutdown.clone());

    let handle = SessionHandle::new(session_id, outbound_tx.clone());
    if events.send(GatewayEvent::SessionOpened(handle)).is_err() {
        warn!(session = %session_id, "engine gone, refusing session");
        return;
    }

    // Handshake confirmation goes out before anything else. There is no
    // credential check behind it.
    if outbound_tx
        .send(OutboundFrame::Response(ResponseMessage::authentication(0)))
        .await
        .is_err()
    {
        let _ = events.send(GatewayEvent::SessionClosed(session_id));
        return;
    }

    let writer = tokio::spawn(write_loop(
        sink,
        outbound_rx,
        session_id,
        config.ping_period(),
        shutdown.clone(),
        shutdown_rx.clone(),
    ));
    let reader = tokio::spawn(read_loop(
        stream,
        session_id,
        events.clone(),
        config.pong_wait,
        shutdown.clone(),
        shutdown_rx,
    ));

    let _ = reader.await;
    let _ = writer.await;

    // Free the slot before announcing the closure, so a prompt reconnect
    // cannot find it still occupied.
    drop(claim);
    let _ = events.send(GatewayEvent::SessionClosed(session_id));
    info!(session = %session_id, "session closed");
}

/// Reader task: decode inbound frames, enforce the pong deadline.
///
/// The deadline resets only on received pongs. Malformed frames are logged
/// and dropped without touching the connection.
async fn read_loop(
    mut stream: SplitStream<WebSocket>,
    session_id: Uuid,
    events: mpsc::UnboundedSender<GatewayEvent>,
    pong_wait: std::time::Duration,
    shutdown: Arc<watch::Sender<bool>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut deadline = Instant::now() + pong_wait;

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            next = tokio::time::timeout_at(deadline, stream.next()) => {
                let item = match next {
                    Err(_) => {
                        warn!(session = %session_id, "pong deadline expired");
                        break;
                    }
                    Ok(None) => {
                        debug!(session = %session_id, "connection stream ended");
                        break;
                    }
                    Ok(Some(Err(err))) => {
                        warn!(session = %session_id, error = %err, "read failed");
                        break;
                    }
                    Ok(Some(Ok(msg))) => msg,
                };

                if item.is_pong() {
                    deadline = Instant::now() + pong_wait;
                    continue;
                }
                if item.is_ping() {
                    // The protocol stack answers pings on our behalf.
                    continue;
                }
                if item.is_close() {
                    info!(session = %session_id, "remote sent close frame");
                    break;
                }
                let Ok(text) = item.to_str() else {
                    debug!(session = %session_id, "dropping non-text frame");
                    continue;
                };

                match remote_proto::decode(text) {
                    Ok(frame) => {
                        if events
                            .send(GatewayEvent::Frame { session_id, frame })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(err) => {
                        // Frame dropped, connection stays open.
                        warn!(session = %session_id, error = %err, "dropping malformed frame");
                    }
                }
            }
        }
    }

    shutdown.send_replace(true);
}

/// Writer task: drain the outbound queue and keep the connection alive.
///
/// Owns the sink half; closes it on exit, which closes the connection.
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<OutboundFrame>,
    session_id: Uuid,
    ping_period: std::time::Duration,
    shutdown: Arc<watch::Sender<bool>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ping = tokio::time::interval_at(Instant::now() + ping_period, ping_period);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            _ = ping.tick() => {
                if let Err(err) = sink.send(Message::ping(Vec::new())).await {
                    warn!(session = %session_id, error = %err, "ping failed");
                    break;
                }
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    debug!(session = %session_id, "outbound queue closed");
                    break;
                };
                match remote_proto::encode(&frame) {
                    Ok(text) => {
                        if let Err(err) = sink.send(Message::text(text)).await {
                            warn!(session = %session_id, error = %err, "write failed");
                            break;
                        }
                    }
                    Err(err) => {
                        // Programming-error class; drop the frame, keep the session.
                        tracing::error!(session = %session_id, error = %err, "unencodable outbound frame");
                    }
                }
            }
        }
    }

    shutdown.send_replace(true);
    let _ = sink.close().await;
}
