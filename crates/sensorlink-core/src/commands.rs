//! Typed commands decoded from descriptor attributes.
//!
//! Descriptors carry four generic integers whose meaning depends on the kind.
//! The conversions here are the only place that interprets them, so drivers
//! and the registry deal with typed values instead of positional integers.
//!
//! | Kind            | attr1                      | attr2          |
//! |-----------------|----------------------------|----------------|
//! | RelayActuator   | 0 off, anything else on    |                |
//! | ServoActuator   | angle, applied if 0..=180  |                |
//! | DistanceSensor  | 0 none, 1 calibrate, 2 reset | expected cm  |

use crate::{
    Result,
    constants::SERVO_MAX_ANGLE,
    error::Error,
    types::{PeripheralDescriptor, PeripheralKind},
};

/// Set-point pushed to a live actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    /// Energize or release a relay.
    SetRelay(bool),

    /// Move a servo to an angle in degrees.
    SetAngle(u8),
}

impl ActuatorCommand {
    /// Decode the set-point carried by an actuator descriptor.
    ///
    /// Returns `None` for non-actuator kinds and for servo angles outside
    /// `0..=180`, which leave the servo where it is.
    #[must_use]
    pub fn from_descriptor(descriptor: &PeripheralDescriptor) -> Option<Self> {
        match descriptor.kind {
            PeripheralKind::RelayActuator => Some(Self::SetRelay(descriptor.attr1 != 0)),
            PeripheralKind::ServoActuator => u8::try_from(descriptor.attr1)
                .ok()
                .filter(|angle| *angle <= SERVO_MAX_ANGLE)
                .map(Self::SetAngle),
            _ => None,
        }
    }
}

/// Calibration request for a distance sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationCommand {
    /// Take a reading and pair it with the expected distance in centimeters.
    Calibrate { expected_cm: f64 },

    /// Discard every sample and restore the identity model.
    Reset,
}

impl CalibrationCommand {
    /// Attribute value meaning "calibrate".
    pub const CALIBRATE_CODE: i32 = 1;

    /// Attribute value meaning "reset calibration".
    pub const RESET_CODE: i32 = 2;

    /// Decode the pending calibration request of a distance sensor descriptor.
    ///
    /// `Ok(None)` means nothing is pending.
    ///
    /// # Errors
    /// Returns `Error::InvalidCommand` for an unknown attr1 code or a
    /// non-positive expected distance.
    pub fn from_descriptor(descriptor: &PeripheralDescriptor) -> Result<Option<Self>> {
        if descriptor.kind != PeripheralKind::DistanceSensor {
            return Ok(None);
        }

        match descriptor.attr1 {
            0 => Ok(None),
            Self::CALIBRATE_CODE if descriptor.attr2 > 0 => Ok(Some(Self::Calibrate {
                expected_cm: f64::from(descriptor.attr2),
            })),
            Self::CALIBRATE_CODE => Err(Error::InvalidCommand(format!(
                "calibration distance must be positive, got {}",
                descriptor.attr2
            ))),
            Self::RESET_CODE => Ok(Some(Self::Reset)),
            other => Err(Error::InvalidCommand(format!(
                "unknown calibration code {other}"
            ))),
        }
    }
}
