//! Reconfiguration protocol of a sensorlink node.
//!
//! Requests arrive on `<device>/settings/...` topics and are answered on the
//! matching `/response` topic with short text payloads:
//!
//! | Request | Payload                               | Reply                                   |
//! |---------|---------------------------------------|-----------------------------------------|
//! | set     | descriptor or `{"sensors": [...]}`    | `OK: n ...`, `PARTIAL: ...`, `ERROR...` |
//! | get     | ignored                               | JSON array of descriptors               |
//! | remove  | `{"id": n}` or `[{"id": n}, ...]`     | `OK: n sensor(es) removido(s)`, `ERROR` |
//! | reset   | ignored                               | none; the node restarts                 |
//!
//! # Example
//!
//! ```
//! use sensorlink_core::DeviceId;
//! use sensorlink_hardware::mock::MockBoard;
//! use sensorlink_protocol::{Dispatch, ProtocolHandler};
//! use sensorlink_registry::Registry;
//! use sensorlink_storage::MemoryBlobStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new(MockBoard::new().shared(), MemoryBlobStore::new()).into_shared();
//! let handler = ProtocolHandler::new(DeviceId::new("ESP32_005")?, registry);
//!
//! let payload = br#"{"id": 1, "tipo": 5, "pinos": [{"pino": 26, "tipo": 2}]}"#;
//! let Dispatch::Reply(reply) = handler.handle("ESP32_005/settings/sensors/set", payload).await? else {
//!     unreachable!()
//! };
//! assert_eq!(reply.payload, "OK: 1 sensor(es) processado(s)");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handler;
pub mod payload;
pub mod response;
pub mod topic;

pub use error::{ProtocolError, ProtocolResult};
pub use handler::{Dispatch, ProtocolHandler, Reply};
pub use payload::{Heartbeat, Telemetry, decode_remove_payload, encode_descriptor_list};
pub use response::{RemoveResponse, SetResponse};
pub use topic::{Request, heartbeat_topic, telemetry_topic};
