//! Peripheral capability traits.
//!
//! Every driver implements [`PeripheralDevice`]. Sensors answer `read()`,
//! actuators additionally accept `apply()`. Two capabilities are specific to
//! a single kind and get their own trait: [`Calibratable`] (ultrasonic
//! distance sensor) and [`KeyScanner`] (matrix keypad).
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::board::InstanceId;
use crate::error::{HardwareError, Result};
use crate::types::Reading;
use sensorlink_core::{ActuatorCommand, PeripheralKind};

/// Common interface of every peripheral driver.
pub trait PeripheralDevice: Send + Sync {
    /// Kind this driver implements.
    fn kind(&self) -> PeripheralKind;

    /// Identity of this driver instance.
    fn instance_id(&self) -> InstanceId;

    /// Pins owned by this driver, in positional order.
    fn pins(&self) -> &[u8];

    /// Acquire one reading.
    ///
    /// Blocks at most for the transducer's acquisition time.
    ///
    /// # Errors
    /// Returns an error if the device stops responding.
    async fn read(&mut self) -> Result<Reading>;

    /// Push a set-point to the device.
    ///
    /// # Errors
    /// Sensors return `HardwareError::Unsupported`; actuators reject commands
    /// meant for another actuator kind the same way.
    async fn apply(&mut self, command: ActuatorCommand) -> Result<()> {
        Err(HardwareError::unsupported(format!(
            "{command:?} on {}",
            self.kind()
        )))
    }
}

/// Devices with a correctable linear response.
pub trait Calibratable {
    /// Take a raw measurement, pair it with the expected value and refit.
    ///
    /// Returns the raw measurement used as the sample.
    ///
    /// # Errors
    /// Returns an error if the raw measurement fails.
    async fn calibrate(&mut self, expected: f64) -> Result<f64>;

    /// Drop every sample and restore the identity model.
    fn reset_calibration(&mut self);
}

/// Devices that deliver discrete key presses.
pub trait KeyScanner {
    /// Scan once. Returns a key only on the scan where it becomes pressed.
    ///
    /// # Errors
    /// Returns an error if a pin cannot be driven or sampled.
    async fn scan(&mut self) -> Result<Option<char>>;
}
