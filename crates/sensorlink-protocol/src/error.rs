use sensorlink_storage::StorageError;
use thiserror::Error;

/// Failures of the reconfiguration protocol.
///
/// Per-descriptor problems never surface here: they are counted into the
/// response payload. These errors describe a request the handler could not
/// answer at all.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Topic is not one of the device's request topics
    #[error("Unroutable topic: {0}")]
    UnknownTopic(String),

    /// Response payload could not be encoded
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Factory reset could not erase the stored configuration
    #[error("Reset failed: {0}")]
    Reset(#[source] StorageError),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
