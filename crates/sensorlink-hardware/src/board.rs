//! Board access layer.
//!
//! The [`Board`] trait is the seam between drivers and the physical pins and
//! buses of the microcontroller. Its methods are thin, synchronous register
//! and pin operations; drivers compose them into peripheral protocols.
//!
//! Pin ownership is tracked by the board. A driver acquires its pins through
//! [`PinClaim::acquire`] and holds the claim for its whole lifetime; dropping
//! the driver drops the claim and releases the pins. Claiming a pin that a
//! live driver already holds fails, so two drivers can never drive the same
//! pin.
//!
//! ```text
//! Registry ──owns──► AnyDriver ──owns──► PinClaim ──releases on drop──► Board
//!                        │
//!                        └──calls──► Board (digital / analog / pulse / PWM / I2C / 1-Wire)
//! ```

use crate::error::{HardwareError, Result};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Shared handle to the board used by every driver.
pub type BoardRef = Arc<dyn Board>;

/// Electrical configuration of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    Input,
    InputPullUp,
    Output,
}

/// Low-level access to pins and buses.
///
/// Implementations must be cheap to call at polling frequency. Every method
/// returns an error instead of panicking when the hardware misbehaves.
pub trait Board: Send + Sync + fmt::Debug {
    /// Reserve pins for exclusive use.
    ///
    /// Either every pin is reserved or none is.
    ///
    /// # Errors
    /// Returns `HardwareError::PinInUse` for the first pin already reserved.
    fn claim_pins(&self, pins: &[u8]) -> Result<()>;

    /// Return pins to the free pool.
    fn release_pins(&self, pins: &[u8]);

    /// Configure a GPIO pin.
    fn set_mode(&self, pin: u8, mode: PinMode) -> Result<()>;

    /// Drive an output pin.
    fn digital_write(&self, pin: u8, high: bool) -> Result<()>;

    /// Sample an input pin.
    fn digital_read(&self, pin: u8) -> Result<bool>;

    /// Sample a 12-bit ADC channel.
    fn analog_read(&self, pin: u8) -> Result<u16>;

    /// Measure the width of the next high pulse on `pin`.
    ///
    /// Returns `None` when no pulse arrives within `timeout`.
    fn pulse_in(&self, pin: u8, timeout: Duration) -> Result<Option<Duration>>;

    /// Emit a servo-style PWM pulse of the given width.
    fn pwm_write(&self, pin: u8, pulse_width_us: u16) -> Result<()>;

    /// Check whether a device acknowledges the I2C address.
    fn i2c_probe(&self, address: u8) -> bool;

    /// Read consecutive registers starting at `register`.
    fn i2c_read(&self, address: u8, register: u8, buffer: &mut [u8]) -> Result<()>;

    /// Write consecutive registers starting at `register`.
    fn i2c_write(&self, address: u8, register: u8, data: &[u8]) -> Result<()>;

    /// Issue a 1-Wire reset and report whether a presence pulse answered.
    fn one_wire_present(&self, pin: u8) -> bool;

    /// Run a temperature conversion on the first 1-Wire sensor of `pin`, in °C.
    fn one_wire_temperature(&self, pin: u8) -> Result<f32>;

    /// Run the single-wire DHT handshake and return (temperature °C, humidity %).
    ///
    /// Either value may be NaN when the sensor reported a checksum error.
    fn dht_read(&self, pin: u8) -> Result<(f32, f32)>;
}

/// Exclusive reservation of a set of pins.
///
/// Released automatically when dropped.
pub struct PinClaim {
    board: BoardRef,
    pins: Vec<u8>,
}

impl PinClaim {
    /// Reserve `pins` on `board`.
    ///
    /// # Errors
    /// Returns `HardwareError::InvalidWiring` if the same pin appears twice,
    /// or `HardwareError::PinInUse` if another claim already holds one.
    pub fn acquire(board: &BoardRef, pins: &[u8]) -> Result<Self> {
        for (index, pin) in pins.iter().enumerate() {
            if pins[..index].contains(pin) {
                return Err(HardwareError::invalid_wiring(format!(
                    "pin {pin} listed more than once"
                )));
            }
        }

        board.claim_pins(pins)?;

        Ok(Self {
            board: Arc::clone(board),
            pins: pins.to_vec(),
        })
    }

    /// Claimed pins in positional order.
    pub fn pins(&self) -> &[u8] {
        &self.pins
    }

    /// Board the pins belong to.
    pub fn board(&self) -> &BoardRef {
        &self.board
    }
}

impl Drop for PinClaim {
    fn drop(&mut self) {
        self.board.release_pins(&self.pins);
    }
}

impl fmt::Debug for PinClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinClaim").field("pins", &self.pins).finish()
    }
}

/// Identity of one driver instance.
///
/// Every constructed driver gets a fresh id, so an unchanged id proves the
/// driver was updated in place rather than recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
