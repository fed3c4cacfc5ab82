use thiserror::Error;

/// Errors surfaced by the WebSocket gateway.
///
/// Connection-level failures (read, write, missed pong) never appear here:
/// they are fatal to the session, not to the gateway, and resolve into a
/// `SessionClosed` notification instead of an error value.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The listen address could not be bound.
    #[error("failed to bind gateway listener: {0}")]
    Bind(String),

    /// Gateway shutdown did not complete cleanly.
    #[error("gateway shutdown failed: {0}")]
    Shutdown(String),
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
