//! Two-axis analog joystick with a push button.
//!
//! Pin order: `[x, y, button]`. The button shorts to ground, so it is read
//! with the pull-up enabled and reported as 1 while pressed.

use crate::board::{BoardRef, InstanceId, PinClaim, PinMode};
use crate::error::Result;
use crate::traits::PeripheralDevice;
use crate::types::Reading;
use sensorlink_core::PeripheralKind;

#[derive(Debug)]
pub struct Joystick {
    instance: InstanceId,
    claim: PinClaim,
    x: u8,
    y: u8,
    button: u8,
}

impl Joystick {
    /// # Errors
    /// Fails if a pin is taken or cannot be configured.
    pub fn new(board: &BoardRef, x: u8, y: u8, button: u8) -> Result<Self> {
        let claim = PinClaim::acquire(board, &[x, y, button])?;
        board.set_mode(x, PinMode::Input)?;
        board.set_mode(y, PinMode::Input)?;
        board.set_mode(button, PinMode::InputPullUp)?;

        Ok(Self {
            instance: InstanceId::next(),
            claim,
            x,
            y,
            button,
        })
    }
}

impl PeripheralDevice for Joystick {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::AnalogJoystick
    }

    fn instance_id(&self) -> InstanceId {
        self.instance
    }

    fn pins(&self) -> &[u8] {
        self.claim.pins()
    }

    async fn read(&mut self) -> Result<Reading> {
        let board = self.claim.board();
        Ok(Reading::new()
            .with("x", board.analog_read(self.x)?)
            .with("y", board.analog_read(self.y)?)
            .with("button", !board.digital_read(self.button)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBoard;
    use crate::types::ReadingValue;

    #[tokio::test]
    async fn test_reads_axes_and_button() {
        let board = MockBoard::new();
        let mut joystick = Joystick::new(&board.shared(), 34, 35, 27).unwrap();
        board.set_analog(34, 2048);
        board.set_analog(35, 4095);

        let reading = joystick.read().await.unwrap();
        assert_eq!(reading.get("x"), Some(&ReadingValue::Int(2048)));
        assert_eq!(reading.get("y"), Some(&ReadingValue::Int(4095)));
        assert_eq!(reading.get("button"), Some(&ReadingValue::Int(0)));

        board.set_input(27, false);
        let reading = joystick.read().await.unwrap();
        assert_eq!(reading.get("button"), Some(&ReadingValue::Int(1)));
    }

    #[test]
    fn test_button_uses_pull_up() {
        let board = MockBoard::new();
        let _joystick = Joystick::new(&board.shared(), 34, 35, 27).unwrap();
        assert_eq!(board.mode(27), Some(PinMode::InputPullUp));
    }
}
