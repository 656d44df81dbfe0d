//! Enum wrapper for driver dispatch.
//!
//! Native `async fn` in traits is not object-safe, so the registry cannot hold
//! `Box<dyn PeripheralDevice>`. [`AnyDriver`] gives it one concrete type with a
//! variant per [`PeripheralKind`] and forwards the trait calls.
//!
//! [`AnyDriver::create`] is the only place that maps a descriptor's positional
//! pin list onto a driver constructor.
//!
//! # Examples
//!
//! ```
//! use sensorlink_core::{PeripheralDescriptor, PeripheralKind, PinRole};
//! use sensorlink_hardware::devices::AnyDriver;
//! use sensorlink_hardware::mock::MockBoard;
//! use sensorlink_hardware::traits::PeripheralDevice;
//!
//! let board = MockBoard::new();
//! let descriptor = PeripheralDescriptor::new(7, PeripheralKind::RelayActuator)
//!     .with_pin(26, PinRole::DigitalOutput);
//!
//! let driver = AnyDriver::create(&descriptor, &board.shared()).unwrap();
//! assert_eq!(driver.kind(), PeripheralKind::RelayActuator);
//! assert!(board.is_claimed(26));
//! ```

use crate::board::{BoardRef, InstanceId};
use crate::drivers::{
    accelerometer::{Accelerometer, AccelerometerSettings},
    climate::ClimateSensor,
    color::ColorSensor,
    joystick::Joystick,
    keypad::MatrixKeypad,
    obstacle::ObstacleDetector,
    one_wire::OneWireThermometer,
    relay::Relay,
    servo::Servo,
    ultrasonic::UltrasonicSensor,
};
use crate::error::{HardwareError, Result};
use crate::traits::PeripheralDevice;
use crate::types::Reading;
use sensorlink_core::{ActuatorCommand, PeripheralDescriptor, PeripheralKind};
use tracing::debug;

/// Any live driver.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyDriver {
    Accelerometer(Accelerometer),
    OneWireTemperature(OneWireThermometer),
    Distance(UltrasonicSensor),
    Color(ColorSensor),
    Servo(Servo),
    Relay(Relay),
    Joystick(Joystick),
    Keypad(MatrixKeypad),
    Obstacle(ObstacleDetector),
    Climate(ClimateSensor),
}

impl AnyDriver {
    /// Construct the driver a descriptor asks for.
    ///
    /// Actuators come up in their initial state and then receive the set-point
    /// carried by the descriptor's attributes.
    ///
    /// # Errors
    /// - `HardwareError::InvalidWiring` when the pin count does not fit the kind
    /// - any construction error of the driver itself (missing device, pin in use)
    pub fn create(descriptor: &PeripheralDescriptor, board: &BoardRef) -> Result<Self> {
        descriptor
            .validate()
            .map_err(|e| HardwareError::invalid_wiring(e.to_string()))?;

        let pins = descriptor.pin_numbers();
        let mut driver = match descriptor.kind {
            PeripheralKind::Accelerometer => {
                let settings = AccelerometerSettings::from_attributes(
                    descriptor.attr1,
                    descriptor.attr2,
                    descriptor.attr3,
                );
                Self::Accelerometer(Accelerometer::new(board, pins.first().copied(), settings)?)
            }
            PeripheralKind::OneWireTemperature => {
                Self::OneWireTemperature(OneWireThermometer::new(board, pins[0])?)
            }
            PeripheralKind::DistanceSensor => {
                Self::Distance(UltrasonicSensor::new(board, pins[0], pins[1])?)
            }
            PeripheralKind::ColorGestureProximity => {
                Self::Color(ColorSensor::new(board, pins.first().copied())?)
            }
            PeripheralKind::ServoActuator => Self::Servo(Servo::new(board, pins[0])?),
            PeripheralKind::RelayActuator => Self::Relay(Relay::new(board, pins[0])?),
            PeripheralKind::AnalogJoystick => {
                Self::Joystick(Joystick::new(board, pins[0], pins[1], pins[2])?)
            }
            PeripheralKind::MatrixKeypad => Self::Keypad(MatrixKeypad::new(
                board,
                [pins[0], pins[1], pins[2], pins[3]],
                [pins[4], pins[5], pins[6], pins[7]],
            )?),
            PeripheralKind::ObstacleDetector => {
                Self::Obstacle(ObstacleDetector::new(board, pins[0])?)
            }
            PeripheralKind::TemperatureHumidity => {
                Self::Climate(ClimateSensor::new(board, pins[0])?)
            }
        };

        match (&mut driver, ActuatorCommand::from_descriptor(descriptor)) {
            (Self::Servo(servo), Some(ActuatorCommand::SetAngle(angle))) => servo.set_angle(angle)?,
            (Self::Relay(relay), Some(ActuatorCommand::SetRelay(on))) => relay.switch(on)?,
            _ => {}
        }

        debug!(
            id = %descriptor.id,
            kind = %descriptor.kind,
            instance = %driver.instance_id(),
            pins = ?driver.pins(),
            "driver created"
        );
        Ok(driver)
    }

    /// Distance sensor view, for calibration.
    pub fn as_distance_mut(&mut self) -> Option<&mut UltrasonicSensor> {
        match self {
            Self::Distance(sensor) => Some(sensor),
            _ => None,
        }
    }

    /// Keypad view, for scanning.
    pub fn as_keypad_mut(&mut self) -> Option<&mut MatrixKeypad> {
        match self {
            Self::Keypad(keypad) => Some(keypad),
            _ => None,
        }
    }

    /// Whether bulk telemetry reads this driver.
    pub fn is_polled(&self) -> bool {
        !matches!(self, Self::Keypad(_))
    }
}

macro_rules! dispatch {
    ($self:expr, $driver:ident => $call:expr) => {
        match $self {
            AnyDriver::Accelerometer($driver) => $call,
            AnyDriver::OneWireTemperature($driver) => $call,
            AnyDriver::Distance($driver) => $call,
            AnyDriver::Color($driver) => $call,
            AnyDriver::Servo($driver) => $call,
            AnyDriver::Relay($driver) => $call,
            AnyDriver::Joystick($driver) => $call,
            AnyDriver::Keypad($driver) => $call,
            AnyDriver::Obstacle($driver) => $call,
            AnyDriver::Climate($driver) => $call,
        }
    };
}

impl PeripheralDevice for AnyDriver {
    fn kind(&self) -> PeripheralKind {
        dispatch!(self, d => d.kind())
    }

    fn instance_id(&self) -> InstanceId {
        dispatch!(self, d => d.instance_id())
    }

    fn pins(&self) -> &[u8] {
        dispatch!(self, d => d.pins())
    }

    async fn read(&mut self) -> Result<Reading> {
        dispatch!(self, d => d.read().await)
    }

    async fn apply(&mut self, command: ActuatorCommand) -> Result<()> {
        dispatch!(self, d => d.apply(command).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBoard;
    use crate::types::ReadingValue;
    use rstest::rstest;
    use sensorlink_core::PinRole;
    use sensorlink_core::constants::{ACCELEROMETER_ADDRESS, COLOR_SENSOR_ADDRESS};

    fn with_pins(kind: PeripheralKind, pins: &[u8]) -> PeripheralDescriptor {
        pins.iter().fold(PeripheralDescriptor::new(1, kind), |d, pin| {
            d.with_pin(*pin, PinRole::DigitalInput)
        })
    }

    /// Board with every bus device present.
    fn populated_board() -> MockBoard {
        let board = MockBoard::new();
        board.attach_i2c(ACCELEROMETER_ADDRESS);
        board.attach_i2c(COLOR_SENSOR_ADDRESS);
        board.set_registers(
            COLOR_SENSOR_ADDRESS,
            crate::drivers::color::registers::ID,
            &[crate::drivers::color::registers::DEVICE_ID],
        );
        board.attach_one_wire(4, 20.0);
        board
    }

    #[rstest]
    #[case(PeripheralKind::Accelerometer, &[])]
    #[case(PeripheralKind::OneWireTemperature, &[4])]
    #[case(PeripheralKind::DistanceSensor, &[5, 18])]
    #[case(PeripheralKind::ColorGestureProximity, &[])]
    #[case(PeripheralKind::ServoActuator, &[12])]
    #[case(PeripheralKind::RelayActuator, &[26])]
    #[case(PeripheralKind::AnalogJoystick, &[34, 35, 27])]
    #[case(PeripheralKind::MatrixKeypad, &[13, 12, 14, 27, 26, 25, 33, 32])]
    #[case(PeripheralKind::ObstacleDetector, &[33])]
    #[case(PeripheralKind::TemperatureHumidity, &[15])]
    fn test_creates_every_kind(#[case] kind: PeripheralKind, #[case] pins: &[u8]) {
        let board = populated_board();
        let driver = AnyDriver::create(&with_pins(kind, pins), &board.shared()).unwrap();

        assert_eq!(driver.kind(), kind);
        assert_eq!(driver.pins(), pins);
        assert_eq!(board.claimed_count(), pins.len());
    }

    #[rstest]
    #[case(PeripheralKind::DistanceSensor, &[5])]
    #[case(PeripheralKind::RelayActuator, &[])]
    #[case(PeripheralKind::MatrixKeypad, &[1, 2, 3, 4, 5, 6, 7])]
    #[case(PeripheralKind::Accelerometer, &[4, 5])]
    fn test_wrong_pin_count_is_invalid_wiring(#[case] kind: PeripheralKind, #[case] pins: &[u8]) {
        let board = populated_board();
        let result = AnyDriver::create(&with_pins(kind, pins), &board.shared());

        assert!(matches!(result, Err(HardwareError::InvalidWiring { .. })));
        assert_eq!(board.claimed_count(), 0);
    }

    #[test]
    fn test_pin_held_by_live_driver_fails() {
        let board = populated_board();
        let shared = board.shared();
        let _relay = AnyDriver::create(&with_pins(PeripheralKind::RelayActuator, &[26]), &shared)
            .unwrap();

        let result = AnyDriver::create(&with_pins(PeripheralKind::ServoActuator, &[26]), &shared);
        assert!(matches!(result, Err(HardwareError::PinInUse { pin: 26 })));
    }

    #[test]
    fn test_missing_bus_device_fails() {
        let board = MockBoard::new();
        let result = AnyDriver::create(
            &with_pins(PeripheralKind::Accelerometer, &[]),
            &board.shared(),
        );
        assert!(matches!(result, Err(HardwareError::DeviceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_actuator_takes_initial_set_point() {
        let board = populated_board();
        let shared = board.shared();

        let relay = with_pins(PeripheralKind::RelayActuator, &[26]).with_attributes(1, 0, 0, 0);
        let mut relay = AnyDriver::create(&relay, &shared).unwrap();
        assert_eq!(board.output(26), Some(true));
        let reading = relay.read().await.unwrap();
        assert_eq!(reading.get("state"), Some(&ReadingValue::Int(1)));

        let servo = with_pins(PeripheralKind::ServoActuator, &[12]).with_attributes(90, 0, 0, 0);
        let mut servo = AnyDriver::create(&servo, &shared).unwrap();
        let reading = servo.read().await.unwrap();
        assert_eq!(reading.get("angle"), Some(&ReadingValue::Int(90)));
    }

    #[tokio::test]
    async fn test_out_of_range_servo_angle_stays_at_zero() {
        let board = populated_board();
        let servo = with_pins(PeripheralKind::ServoActuator, &[12]).with_attributes(200, 0, 0, 0);
        let mut servo = AnyDriver::create(&servo, &board.shared()).unwrap();

        let reading = servo.read().await.unwrap();
        assert_eq!(reading.get("angle"), Some(&ReadingValue::Int(0)));
    }

    #[tokio::test]
    async fn test_dispatch_apply() {
        let board = populated_board();
        let mut relay =
            AnyDriver::create(&with_pins(PeripheralKind::RelayActuator, &[26]), &board.shared())
                .unwrap();

        relay.apply(ActuatorCommand::SetRelay(true)).await.unwrap();
        assert_eq!(board.output(26), Some(true));
    }

    #[test]
    fn test_views() {
        let board = populated_board();
        let shared = board.shared();

        let mut distance =
            AnyDriver::create(&with_pins(PeripheralKind::DistanceSensor, &[5, 18]), &shared)
                .unwrap();
        assert!(distance.as_distance_mut().is_some());
        assert!(distance.as_keypad_mut().is_none());
        assert!(distance.is_polled());

        let mut keypad = AnyDriver::create(
            &with_pins(PeripheralKind::MatrixKeypad, &[13, 12, 14, 27, 26, 25, 33, 32]),
            &shared,
        )
        .unwrap();
        assert!(keypad.as_keypad_mut().is_some());
        assert!(!keypad.is_polled());
    }

    #[test]
    fn test_drop_releases_every_pin() {
        let board = populated_board();
        let driver =
            AnyDriver::create(&with_pins(PeripheralKind::AnalogJoystick, &[34, 35, 27]), &board.shared())
                .unwrap();
        assert_eq!(board.claimed_count(), 3);
        drop(driver);
        assert_eq!(board.claimed_count(), 0);
    }
}
