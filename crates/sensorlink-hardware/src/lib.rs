//! Peripheral drivers for the sensorlink node.
//!
//! This crate turns a [`PeripheralDescriptor`](sensorlink_core::PeripheralDescriptor)
//! into a live driver that owns its pins, produces readings and, for
//! actuators, accepts set-points.
//!
//! # Layers
//!
//! ```text
//! devices::AnyDriver        one concrete type for the registry (enum dispatch)
//!        │
//! drivers::*                one module per PeripheralKind
//!        │
//! board::Board              pins, ADC, pulse timing, PWM, I2C, 1-Wire, DHT
//!        │
//! mock::MockBoard           in-memory board for tests and simulation
//! ```
//!
//! # Capabilities
//!
//! - [`PeripheralDevice`]: every driver. `read()` yields a [`Reading`], an
//!   ordered set of named scalars that becomes the telemetry `values` object.
//! - [`Calibratable`]: the ultrasonic distance sensor, backed by a
//!   [`LinearCalibration`](calibration::LinearCalibration).
//! - [`KeyScanner`]: the matrix keypad, which reports key-down edges instead of
//!   bulk readings.
//!
//! # Example
//!
//! ```
//! use sensorlink_core::{PeripheralDescriptor, PeripheralKind, PinRole};
//! use sensorlink_hardware::devices::AnyDriver;
//! use sensorlink_hardware::mock::MockBoard;
//! use sensorlink_hardware::traits::PeripheralDevice;
//!
//! #[tokio::main]
//! async fn main() -> sensorlink_hardware::Result<()> {
//!     let board = MockBoard::new();
//!     board.set_analog(34, 1000);
//!     board.set_analog(35, 3000);
//!
//!     let descriptor = PeripheralDescriptor::new(3, PeripheralKind::AnalogJoystick)
//!         .with_pin(34, PinRole::Analog)
//!         .with_pin(35, PinRole::Analog)
//!         .with_pin(27, PinRole::DigitalInput);
//!
//!     let mut joystick = AnyDriver::create(&descriptor, &board.shared())?;
//!     let reading = joystick.read().await?;
//!     assert_eq!(reading.to_string(), "x=1000, y=3000, button=0");
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod calibration;
pub mod devices;
pub mod drivers;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use board::{Board, BoardRef, InstanceId, PinClaim, PinMode};
pub use devices::AnyDriver;
pub use error::{HardwareError, Result};
pub use traits::{Calibratable, KeyScanner, PeripheralDevice};
pub use types::{Reading, ReadingValue};
