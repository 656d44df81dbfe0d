use thiserror::Error;

/// Broker transport failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request could not be queued to the MQTT client
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// Network session failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Startup connection attempts ran out
    #[error("Broker unreachable after {attempts} attempts")]
    ConnectFailed { attempts: u32 },

    /// Broker did not take a publish
    #[error("Publish to '{topic}' failed: {message}")]
    Publish { topic: String, message: String },

    /// Session is shut down
    #[error("Transport closed")]
    Closed,
}

impl TransportError {
    pub fn publish(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            topic: topic.into(),
            message: message.into(),
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
