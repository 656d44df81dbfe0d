//! Mock hardware for testing and development.
//!
//! This module provides an in-memory board that can be controlled
//! programmatically, so every driver can run without physical hardware.

pub mod board;
mod simulation;

pub use board::MockBoard;
