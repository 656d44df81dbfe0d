use thiserror::Error;

use crate::types::PeripheralKind;

#[derive(Error, Debug)]
pub enum Error {
    // Decode errors
    #[error("Invalid payload: {0}")]
    Decode(String),

    #[error("Unknown peripheral kind code: {0}")]
    UnknownKind(i64),

    #[error("Unknown pin role code: {0}")]
    UnknownPinRole(i64),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // Validation errors
    #[error("{kind} expects {expected} pins, got {actual}")]
    InvalidPinCount {
        kind: PeripheralKind,
        expected: String,
        actual: usize,
    },

    #[error("Invalid device id: {0}")]
    InvalidDeviceId(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error stems from an undecodable or incomplete payload.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Decode(_)
                | Self::UnknownKind(_)
                | Self::UnknownPinRole(_)
                | Self::MissingField(_)
                | Self::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
