use thiserror::Error;

/// Errors produced while decoding or encoding protocol frames.
#[derive(Error, Debug)]
pub enum ProtoError {
    /// The inbound frame was not valid JSON or did not match the envelope shape.
    ///
    /// The offending frame is dropped; the connection stays open.
    #[error("malformed message: {source}")]
    MalformedMessage {
        #[source]
        source: serde_json::Error,
    },

    /// The envelope was parseable but a required field was missing.
    #[error("malformed message: missing field `{0}`")]
    MissingField(&'static str),

    /// The envelope carried a `kind` discriminator this side does not accept.
    #[error("unknown envelope kind `{0}`")]
    UnknownKind(String),

    /// An internal structure failed to serialize.
    ///
    /// Well-formed internal structures always encode; hitting this is a
    /// programming error, not a runtime condition. Callers log and drop.
    #[error("failed to encode outbound frame: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, ProtoError>;
