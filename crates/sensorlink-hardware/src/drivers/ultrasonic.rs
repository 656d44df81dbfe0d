//! Ultrasonic distance sensor (HC-SR04 style trigger/echo pair).
//!
//! Pin order: `[trigger, echo]`. The raw distance is the echo width times the
//! speed of sound, halved for the round trip; the calibrated distance applies
//! a [`LinearCalibration`].

use crate::board::{BoardRef, InstanceId, PinClaim, PinMode};
use crate::calibration::LinearCalibration;
use crate::error::{HardwareError, Result};
use crate::traits::{Calibratable, PeripheralDevice};
use crate::types::Reading;
use sensorlink_core::PeripheralKind;
use sensorlink_core::constants::{ECHO_TIMEOUT_MS, SOUND_SPEED_CM_PER_US};
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub struct UltrasonicSensor {
    instance: InstanceId,
    claim: PinClaim,
    trigger: u8,
    echo: u8,
    calibration: LinearCalibration,
}

impl UltrasonicSensor {
    /// # Errors
    /// Fails if either pin is taken or cannot be configured.
    pub fn new(board: &BoardRef, trigger: u8, echo: u8) -> Result<Self> {
        let claim = PinClaim::acquire(board, &[trigger, echo])?;
        board.set_mode(trigger, PinMode::Output)?;
        board.set_mode(echo, PinMode::Input)?;
        board.digital_write(trigger, false)?;

        Ok(Self {
            instance: InstanceId::next(),
            claim,
            trigger,
            echo,
            calibration: LinearCalibration::new(),
        })
    }

    /// Uncorrected distance in centimeters.
    ///
    /// # Errors
    /// Returns `HardwareError::Timeout` when no echo returns in time.
    pub fn raw_distance_cm(&self) -> Result<f64> {
        let board = self.claim.board();

        board.digital_write(self.trigger, false)?;
        board.digital_write(self.trigger, true)?;
        board.digital_write(self.trigger, false)?;

        let width = board
            .pulse_in(self.echo, Duration::from_millis(ECHO_TIMEOUT_MS))?
            .ok_or_else(|| HardwareError::timeout(ECHO_TIMEOUT_MS))?;

        Ok(width.as_micros() as f64 * f64::from(SOUND_SPEED_CM_PER_US) / 2.0)
    }

    /// Calibrated distance in centimeters.
    ///
    /// # Errors
    /// Returns `HardwareError::Timeout` when no echo returns in time.
    pub fn distance_cm(&self) -> Result<f64> {
        Ok(self.calibration.correct(self.raw_distance_cm()?))
    }

    pub fn calibration(&self) -> &LinearCalibration {
        &self.calibration
    }
}

impl PeripheralDevice for UltrasonicSensor {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::DistanceSensor
    }

    fn instance_id(&self) -> InstanceId {
        self.instance
    }

    fn pins(&self) -> &[u8] {
        self.claim.pins()
    }

    async fn read(&mut self) -> Result<Reading> {
        Ok(Reading::new().with("distance", self.distance_cm()?))
    }
}

impl Calibratable for UltrasonicSensor {
    async fn calibrate(&mut self, expected: f64) -> Result<f64> {
        let raw = self.raw_distance_cm()?;
        self.calibration.add_sample(raw, expected);
        debug!(
            raw,
            expected,
            slope = self.calibration.slope(),
            intercept = self.calibration.intercept(),
            samples = self.calibration.sample_count(),
            "distance sensor calibrated"
        );
        Ok(raw)
    }

    fn reset_calibration(&mut self) {
        self.calibration.reset();
        debug!("distance sensor calibration reset");
    }
}
