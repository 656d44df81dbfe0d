//! Durable configuration storage for the sensorlink node.
//!
//! Everything the node must remember across restarts is a small JSON blob:
//!
//! | Blob           | Content                                   |
//! |----------------|-------------------------------------------|
//! | `devices.json` | snapshot of every configured peripheral   |
//! | `mqtt.json`    | broker host, port and device id           |
//! | `topics.json`  | topics subscribed after each connection   |
//!
//! # Architecture
//!
//! - [`BlobStore`] - whole-value read/replace/remove of named blobs
//! - [`FsBlobStore`] - one file per blob, atomic replace via rename
//! - [`MemoryBlobStore`] - in-process store with write fault injection
//! - [`AnyBlobStore`] - enum dispatch over the backends
//! - [`snapshot`] - `devices.json` codec
//! - [`settings`] - `mqtt.json` and `topics.json`
//!
//! # Examples
//!
//! ```no_run
//! use sensorlink_core::{PeripheralDescriptor, PeripheralKind, PinRole};
//! use sensorlink_storage::{AnyBlobStore, FsBlobStore, snapshot};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = AnyBlobStore::from(FsBlobStore::open("/var/lib/sensorlink").await?);
//!
//! let relay = PeripheralDescriptor::new(1, PeripheralKind::RelayActuator)
//!     .with_pin(26, PinRole::DigitalOutput);
//! snapshot::save_snapshot(&store, &[relay]).await?;
//!
//! let items = snapshot::load_snapshot(&store).await?.unwrap_or_default();
//! assert_eq!(items.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod settings;
pub mod snapshot;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use settings::{BrokerSettings, TopicList};
pub use store::{AnyBlobStore, BlobStore, FsBlobStore, MemoryBlobStore, erase_configuration};
