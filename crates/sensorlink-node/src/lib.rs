//! sensorlink node runtime.
//!
//! The binary wires the crates together:
//!
//! ```text
//!                       ┌──────────────────────┐
//!   broker ◄──────────► │ MqttSession          │ ── inbound ──► run_dispatch ──► ProtocolHandler
//!      ▲                └──────────────────────┘                                      │
//!      │ telemetry, heartbeat                                                         ▼
//!   Poller ◄──────────────── SharedRegistry (tokio Mutex) ◄──────────────────── add/update/remove
//!                                   │
//!                          Board + BlobStore
//! ```
//!
//! This library holds the parts with behavior of their own: configuration
//! resolution, keypad buffers, the polling loop and the simulated world.

pub mod config;
pub mod keypad;
pub mod poller;
pub mod simulation;

pub use config::{Args, NodeConfig};
pub use keypad::{KeypadBuffer, KeypadBuffers};
pub use poller::Poller;

/// Exit status asking the supervisor for a restart (factory reset, broker
/// unreachable at startup, session lost).
pub const RESTART_EXIT_CODE: u8 = 3;
