//! Peripheral drivers, one module per supported kind.
//!
//! Every driver owns a [`PinClaim`](crate::board::PinClaim) for its pins and
//! talks to the hardware only through the [`Board`](crate::board::Board) trait.

pub mod accelerometer;
pub mod climate;
pub mod color;
pub mod joystick;
pub mod keypad;
pub mod obstacle;
pub mod one_wire;
pub mod relay;
pub mod servo;
pub mod ultrasonic;
