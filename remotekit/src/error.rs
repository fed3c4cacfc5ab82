use thiserror::Error;

/// Errors surfaced by the driver runtime.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The builder was given unusable driver metadata.
    #[error("invalid driver metadata: {0}")]
    InvalidMetadata(String),

    /// The builder is missing a device handler.
    #[error("no device handler registered")]
    MissingHandler,

    /// The transport layer failed.
    #[error(transparent)]
    Gateway(#[from] ws_gateway::GatewayError),

    /// Shutdown did not complete cleanly.
    #[error("driver shutdown failed: {0}")]
    Shutdown(String),
}

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;
