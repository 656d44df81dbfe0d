//! Error types for hardware operations.
//!
//! Driver construction and I/O failures are values, never panics: the
//! registry drops the affected peripheral and keeps running.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while constructing or driving a peripheral.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// No device answered at the expected bus address or pin.
    #[error("Device not found: {device}")]
    DeviceNotFound { device: String },

    /// Pin is already claimed by another live driver.
    #[error("Pin {pin} is already in use")]
    PinInUse { pin: u8 },

    /// Descriptor wiring does not match what the driver needs.
    #[error("Invalid wiring: {message}")]
    InvalidWiring { message: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Operation is not supported by this peripheral.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Bus or pin communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data received from device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new device not found error.
    pub fn not_found(device: impl Into<String>) -> Self {
        Self::DeviceNotFound {
            device: device.into(),
        }
    }

    /// Create a new pin conflict error.
    pub fn pin_in_use(pin: u8) -> Self {
        Self::PinInUse { pin }
    }

    /// Create a new invalid wiring error.
    pub fn invalid_wiring(message: impl Into<String>) -> Self {
        Self::InvalidWiring {
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
