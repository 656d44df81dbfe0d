//! Color, proximity and gesture sensor on the shared I2C bus (APDS-9960).
//!
//! The optional pin is the active-low interrupt line. When it is wired, a
//! proximity value is only taken while the line is asserted; otherwise the
//! proximity register is read on every poll.

use crate::board::{BoardRef, InstanceId, PinClaim, PinMode};
use crate::error::{HardwareError, Result};
use crate::traits::PeripheralDevice;
use crate::types::Reading;
use sensorlink_core::PeripheralKind;
use sensorlink_core::constants::COLOR_SENSOR_ADDRESS;
use tracing::debug;

pub(crate) mod registers {
    pub const ENABLE: u8 = 0x80;
    pub const CONTROL: u8 = 0x8F;
    pub const ID: u8 = 0x92;
    pub const CDATAL: u8 = 0x94;
    pub const PDATA: u8 = 0x9C;
    pub const GFLVL: u8 = 0xAE;
    pub const GFIFO_U: u8 = 0xFC;

    pub const DEVICE_ID: u8 = 0xAB;
}

/// Power on, color (ALS), proximity and gesture engines.
const ENABLE_ALL: u8 = 0b0100_0111;

/// 16x color gain.
const COLOR_GAIN_16X: u8 = 0b10;

/// Minimum photodiode delta to accept a swipe.
const GESTURE_THRESHOLD: i16 = 13;

/// Swipe direction, encoded as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Gesture {
    None = 0,
    Up = 1,
    Down = 2,
    Left = 3,
    Right = 4,
}

impl Gesture {
    /// Classify one gesture FIFO frame (up, down, left, right photodiodes).
    pub fn from_frame(up: u8, down: u8, left: u8, right: u8) -> Self {
        let vertical = i16::from(up) - i16::from(down);
        let horizontal = i16::from(left) - i16::from(right);

        if vertical.abs() < GESTURE_THRESHOLD && horizontal.abs() < GESTURE_THRESHOLD {
            Self::None
        } else if vertical.abs() >= horizontal.abs() {
            if vertical > 0 { Self::Up } else { Self::Down }
        } else if horizontal > 0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

#[derive(Debug)]
pub struct ColorSensor {
    instance: InstanceId,
    claim: PinClaim,
    interrupt: Option<u8>,
}

impl ColorSensor {
    /// # Errors
    /// Returns `HardwareError::DeviceNotFound` if nothing acknowledges the
    /// address, or `HardwareError::InitializationFailed` if the chip id is wrong.
    pub fn new(board: &BoardRef, interrupt: Option<u8>) -> Result<Self> {
        let claim = PinClaim::acquire(board, interrupt.as_slice())?;

        if let Some(pin) = interrupt {
            board.set_mode(pin, PinMode::InputPullUp)?;
        }

        if !board.i2c_probe(COLOR_SENSOR_ADDRESS) {
            return Err(HardwareError::not_found(format!(
                "color sensor at 0x{COLOR_SENSOR_ADDRESS:02X}"
            )));
        }

        let mut id = [0u8];
        board.i2c_read(COLOR_SENSOR_ADDRESS, registers::ID, &mut id)?;
        if id[0] != registers::DEVICE_ID {
            return Err(HardwareError::initialization_failed(format!(
                "unexpected color sensor id 0x{:02X}",
                id[0]
            )));
        }

        board.i2c_write(COLOR_SENSOR_ADDRESS, registers::CONTROL, &[COLOR_GAIN_16X])?;
        board.i2c_write(COLOR_SENSOR_ADDRESS, registers::ENABLE, &[ENABLE_ALL])?;

        debug!(?interrupt, "color sensor ready");

        Ok(Self {
            instance: InstanceId::next(),
            claim,
            interrupt,
        })
    }

    fn proximity(&self) -> Result<u8> {
        let board = self.claim.board();
        if let Some(pin) = self.interrupt
            && board.digital_read(pin)?
        {
            return Ok(0);
        }

        let mut value = [0u8];
        board.i2c_read(COLOR_SENSOR_ADDRESS, registers::PDATA, &mut value)?;
        Ok(value[0])
    }

    fn gesture(&self) -> Result<Gesture> {
        let board = self.claim.board();
        let mut level = [0u8];
        board.i2c_read(COLOR_SENSOR_ADDRESS, registers::GFLVL, &mut level)?;
        if level[0] == 0 {
            return Ok(Gesture::None);
        }

        let mut frame = [0u8; 4];
        board.i2c_read(COLOR_SENSOR_ADDRESS, registers::GFIFO_U, &mut frame)?;
        Ok(Gesture::from_frame(frame[0], frame[1], frame[2], frame[3]))
    }
}

impl PeripheralDevice for ColorSensor {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::ColorGestureProximity
    }

    fn instance_id(&self) -> InstanceId {
        self.instance
    }

    fn pins(&self) -> &[u8] {
        self.claim.pins()
    }

    async fn read(&mut self) -> Result<Reading> {
        let mut raw = [0u8; 8];
        self.claim
            .board()
            .i2c_read(COLOR_SENSOR_ADDRESS, registers::CDATAL, &mut raw)?;
        let channel = |i: usize| u16::from_le_bytes([raw[i], raw[i + 1]]);

        Ok(Reading::new()
            .with("red", channel(2))
            .with("green", channel(4))
            .with("blue", channel(6))
            .with("clear", channel(0))
            .with("proximity", self.proximity()?)
            .with("gesture", self.gesture()? as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBoard;
    use crate::types::ReadingValue;
    use rstest::rstest;

    fn attached_board() -> MockBoard {
        let board = MockBoard::new();
        board.attach_i2c(COLOR_SENSOR_ADDRESS);
        board.set_registers(COLOR_SENSOR_ADDRESS, registers::ID, &[registers::DEVICE_ID]);
        board
    }

    #[rstest]
    #[case(200, 20, 100, 100, Gesture::Up)]
    #[case(20, 200, 100, 100, Gesture::Down)]
    #[case(100, 100, 200, 20, Gesture::Left)]
    #[case(100, 100, 20, 200, Gesture::Right)]
    #[case(100, 105, 100, 95, Gesture::None)]
    fn test_gesture_classification(
        #[case] up: u8,
        #[case] down: u8,
        #[case] left: u8,
        #[case] right: u8,
        #[case] expected: Gesture,
    ) {
        assert_eq!(Gesture::from_frame(up, down, left, right), expected);
    }

    #[test]
    fn test_wrong_chip_id_fails() {
        let board = MockBoard::new();
        board.attach_i2c(COLOR_SENSOR_ADDRESS);
        assert!(matches!(
            ColorSensor::new(&board.shared(), None),
            Err(HardwareError::InitializationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_enables_engines() {
        let board = attached_board();
        ColorSensor::new(&board.shared(), None).unwrap();
        assert_eq!(board.register(COLOR_SENSOR_ADDRESS, registers::ENABLE), Some(ENABLE_ALL));
    }

    #[tokio::test]
    async fn test_read_channels() {
        let board = attached_board();
        let mut sensor = ColorSensor::new(&board.shared(), None).unwrap();

        let mut raw = Vec::new();
        for value in [400u16, 100, 200, 300] {
            raw.extend_from_slice(&value.to_le_bytes());
        }
        board.set_registers(COLOR_SENSOR_ADDRESS, registers::CDATAL, &raw);
        board.set_registers(COLOR_SENSOR_ADDRESS, registers::PDATA, &[42]);

        let reading = sensor.read().await.unwrap();
        assert_eq!(reading.get("clear"), Some(&ReadingValue::Int(400)));
        assert_eq!(reading.get("red"), Some(&ReadingValue::Int(100)));
        assert_eq!(reading.get("green"), Some(&ReadingValue::Int(200)));
        assert_eq!(reading.get("blue"), Some(&ReadingValue::Int(300)));
        assert_eq!(reading.get("proximity"), Some(&ReadingValue::Int(42)));
        assert_eq!(reading.get("gesture"), Some(&ReadingValue::Int(0)));
    }

    #[tokio::test]
    async fn test_proximity_gated_by_interrupt_line() {
        let board = attached_board();
        board.set_registers(COLOR_SENSOR_ADDRESS, registers::PDATA, &[42]);
        let mut sensor = ColorSensor::new(&board.shared(), Some(25)).unwrap();

        // line idle (high): nothing to report
        let reading = sensor.read().await.unwrap();
        assert_eq!(reading.get("proximity"), Some(&ReadingValue::Int(0)));

        board.set_input(25, false);
        let reading = sensor.read().await.unwrap();
        assert_eq!(reading.get("proximity"), Some(&ReadingValue::Int(42)));
    }

    #[tokio::test]
    async fn test_gesture_from_fifo() {
        let board = attached_board();
        let mut sensor = ColorSensor::new(&board.shared(), None).unwrap();
        board.set_registers(COLOR_SENSOR_ADDRESS, registers::GFLVL, &[1]);
        board.set_registers(COLOR_SENSOR_ADDRESS, registers::GFIFO_U, &[10, 10, 200, 10]);

        let reading = sensor.read().await.unwrap();
        assert_eq!(reading.get("gesture"), Some(&ReadingValue::Int(3)));
    }
}
