use thiserror::Error;

/// Storage-specific error types for the sensorlink node.
///
/// These errors represent failures reading, writing or decoding the
/// configuration blobs kept on the node's flash (or a directory standing in
/// for it).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation on a blob failed
    #[error("I/O error on '{blob}': {source}")]
    Io {
        blob: String,
        #[source]
        source: std::io::Error,
    },

    /// Encoding or decoding JSON failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blob exists but does not hold what it should
    #[error("Corrupt blob '{blob}': {message}")]
    Corrupt { blob: String, message: String },

    /// Blob name would escape the store
    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    /// Backend refused the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Store could not be set up
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    pub fn io(blob: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            blob: blob.into(),
            source,
        }
    }

    pub fn corrupt(blob: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            blob: blob.into(),
            message: message.into(),
        }
    }

    /// Whether the blob was readable but its content is unusable.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. } | Self::Serialization(_))
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
