use sensorlink_core::SensorId;
use sensorlink_hardware::HardwareError;
use sensorlink_storage::StorageError;
use thiserror::Error;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Descriptor rejected before any hardware was touched
    #[error("Invalid descriptor: {0}")]
    Validation(#[from] sensorlink_core::Error),

    /// Driver could not be built or refused a command
    #[error("Driver error for sensor {id}: {source}")]
    Driver {
        id: SensorId,
        #[source]
        source: HardwareError,
    },

    /// Memory was changed but the snapshot could not be written
    #[error("Persistence failed: {0}")]
    Persistence(#[source] StorageError),

    /// Snapshot exists but could not be read or parsed
    #[error("Snapshot unreadable: {0}")]
    Snapshot(#[source] StorageError),

    /// No entry with this id
    #[error("Sensor {0} not found")]
    NotFound(SensorId),
}

impl RegistryError {
    pub fn driver(id: SensorId, source: HardwareError) -> Self {
        Self::Driver { id, source }
    }

    /// Whether the in-memory change happened and only the write is missing.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
