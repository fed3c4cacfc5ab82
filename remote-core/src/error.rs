use thiserror::Error;

/// Errors surfaced by the protocol engine.
///
/// Protocol-level misses (unknown entity, unknown command) are not errors
/// here: they resolve into response codes on the wire.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An entity with this id is already in the catalog.
    #[error("entity `{0}` is already registered")]
    DuplicateEntity(String),

    /// The engine task is gone; its command channel is closed.
    #[error("engine command channel closed")]
    ChannelClosed,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, CoreError>;
