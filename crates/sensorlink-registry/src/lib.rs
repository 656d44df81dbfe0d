//! Live peripheral registry of the sensorlink node.
//!
//! [`Registry`] keeps the ordered set of configured peripherals, each one a
//! [`PeripheralDescriptor`](sensorlink_core::PeripheralDescriptor) paired with
//! the [`AnyDriver`](sensorlink_hardware::AnyDriver) built from it, and keeps
//! the `devices.json` snapshot in step with it.
//!
//! # Examples
//!
//! ```
//! use sensorlink_core::{PeripheralDescriptor, PeripheralKind, PinRole};
//! use sensorlink_hardware::mock::MockBoard;
//! use sensorlink_registry::{Outcome, Registry};
//! use sensorlink_storage::MemoryBlobStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let board = MockBoard::new();
//!     let mut registry = Registry::new(board.shared(), MemoryBlobStore::new());
//!
//!     let relay = PeripheralDescriptor::new(1, PeripheralKind::RelayActuator)
//!         .with_pin(26, PinRole::DigitalOutput);
//!     assert_eq!(registry.add_or_update(relay).await?, Outcome::Added);
//!     assert_eq!(registry.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use registry::{Entry, Outcome, Registry, SharedRegistry};
