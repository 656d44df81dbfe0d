//! Hobby servo on a PWM pin.

use crate::board::{BoardRef, InstanceId, PinClaim, PinMode};
use crate::error::{HardwareError, Result};
use crate::traits::PeripheralDevice;
use crate::types::Reading;
use sensorlink_core::constants::SERVO_MAX_ANGLE;
use sensorlink_core::{ActuatorCommand, PeripheralKind};
use tracing::debug;

/// Pulse width at 0°.
const MIN_PULSE_US: u16 = 500;

/// Pulse width at 180°.
const MAX_PULSE_US: u16 = 2400;

/// Pulse width for `angle`, clamped to the mechanical range.
pub fn pulse_width_for(angle: u8) -> u16 {
    let angle = u32::from(angle.min(SERVO_MAX_ANGLE));
    let span = u32::from(MAX_PULSE_US - MIN_PULSE_US);
    MIN_PULSE_US + (angle * span / u32::from(SERVO_MAX_ANGLE)) as u16
}

#[derive(Debug)]
pub struct Servo {
    instance: InstanceId,
    claim: PinClaim,
    pin: u8,
    angle: u8,
}

impl Servo {
    /// Attach the servo and park it at 0°.
    ///
    /// # Errors
    /// Fails if the pin is taken or the PWM channel cannot be configured.
    pub fn new(board: &BoardRef, pin: u8) -> Result<Self> {
        let claim = PinClaim::acquire(board, &[pin])?;
        board.set_mode(pin, PinMode::Output)?;

        let mut servo = Self {
            instance: InstanceId::next(),
            claim,
            pin,
            angle: 0,
        };
        servo.set_angle(0)?;
        Ok(servo)
    }

    /// Last commanded angle.
    pub fn angle(&self) -> u8 {
        self.angle
    }

    /// Move to `angle`, clamped to 180°.
    ///
    /// # Errors
    /// Fails if the PWM write fails; the last angle is kept.
    pub fn set_angle(&mut self, angle: u8) -> Result<()> {
        let angle = angle.min(SERVO_MAX_ANGLE);
        self.claim.board().pwm_write(self.pin, pulse_width_for(angle))?;
        self.angle = angle;
        debug!(pin = self.pin, angle, "servo moved");
        Ok(())
    }
}

impl PeripheralDevice for Servo {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::ServoActuator
    }

    fn instance_id(&self) -> InstanceId {
        self.instance
    }

    fn pins(&self) -> &[u8] {
        self.claim.pins()
    }

    async fn read(&mut self) -> Result<Reading> {
        Ok(Reading::new().with("angle", self.angle))
    }

    async fn apply(&mut self, command: ActuatorCommand) -> Result<()> {
        match command {
            ActuatorCommand::SetAngle(angle) => self.set_angle(angle),
            other => Err(HardwareError::unsupported(format!("{other:?} on servo"))),
        }
    }
}
