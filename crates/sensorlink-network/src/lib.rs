//! Broker side of a sensorlink node.
//!
//! - [`Transport`]: publish/subscribe seam, with an MQTT implementation
//!   ([`MqttTransport`]) and an in-memory one ([`RecordingTransport`])
//! - [`MqttSession`]: connection with bounded startup retries and unbounded
//!   reconnection afterwards
//! - [`run_dispatch`]: feeds inbound requests to the protocol handler and
//!   publishes replies with [`publish_with_retry`]
//! - [`run_heartbeat`]: periodic liveness message

pub mod dispatch;
pub mod error;
pub mod heartbeat;
pub mod mqtt;
pub mod publisher;
pub mod transport;

pub use dispatch::{DispatchExit, run_dispatch};
pub use error::{TransportError, TransportResult};
pub use heartbeat::{HeartbeatIdentity, run_heartbeat};
pub use mqtt::{MqttSession, MqttSettings, MqttTransport, ReconnectPolicy};
pub use publisher::{RetryPolicy, publish_with_retry};
pub use transport::{AnyTransport, InboundMessage, Published, RecordingTransport, Transport};
