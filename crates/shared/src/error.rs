use thiserror::Error;

/// Failure to decode or encode a wire frame.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Not a `{ key, data }` JSON envelope
    #[error("Malformed frame: {0}")]
    Malformed(String),

    /// Envelope key this client does not handle
    #[error("Unrecognized message key '{0}'")]
    UnknownKey(String),

    /// Known key, but `data` did not match the expected shape
    #[error("Invalid '{key}' payload: {message}")]
    InvalidPayload { key: String, message: String },

    #[error("Failed to encode frame: {0}")]
    Encode(String),
}
