//! Single-channel relay on a digital output. High energizes the coil.

use crate::board::{BoardRef, InstanceId, PinClaim, PinMode};
use crate::error::{HardwareError, Result};
use crate::traits::PeripheralDevice;
use crate::types::Reading;
use sensorlink_core::{ActuatorCommand, PeripheralKind};
use tracing::debug;

#[derive(Debug)]
pub struct Relay {
    instance: InstanceId,
    claim: PinClaim,
    pin: u8,
    energized: bool,
}

impl Relay {
    /// Attach the relay released (output low).
    ///
    /// # Errors
    /// Fails if the pin is taken or cannot be driven.
    pub fn new(board: &BoardRef, pin: u8) -> Result<Self> {
        let claim = PinClaim::acquire(board, &[pin])?;
        board.set_mode(pin, PinMode::Output)?;
        board.digital_write(pin, false)?;

        Ok(Self {
            instance: InstanceId::next(),
            claim,
            pin,
            energized: false,
        })
    }

    pub fn is_energized(&self) -> bool {
        self.energized
    }

    /// # Errors
    /// Fails if the pin cannot be driven; the last state is kept.
    pub fn switch(&mut self, energized: bool) -> Result<()> {
        self.claim.board().digital_write(self.pin, energized)?;
        self.energized = energized;
        debug!(pin = self.pin, energized, "relay switched");
        Ok(())
    }
}

impl PeripheralDevice for Relay {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::RelayActuator
    }

    fn instance_id(&self) -> InstanceId {
        self.instance
    }

    fn pins(&self) -> &[u8] {
        self.claim.pins()
    }

    async fn read(&mut self) -> Result<Reading> {
        Ok(Reading::new().with("state", self.energized))
    }

    async fn apply(&mut self, command: ActuatorCommand) -> Result<()> {
        match command {
            ActuatorCommand::SetRelay(energized) => self.switch(energized),
            other => Err(HardwareError::unsupported(format!("{other:?} on relay"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBoard;
    use crate::types::ReadingValue;

    #[tokio::test]
    async fn test_initially_released() {
        let board = MockBoard::new();
        let mut relay = Relay::new(&board.shared(), 26).unwrap();

        assert_eq!(board.output(26), Some(false));
        let reading = relay.read().await.unwrap();
        assert_eq!(reading.get("state"), Some(&ReadingValue::Int(0)));
    }

    #[tokio::test]
    async fn test_switch_on_and_off() {
        let board = MockBoard::new();
        let mut relay = Relay::new(&board.shared(), 26).unwrap();

        relay.apply(ActuatorCommand::SetRelay(true)).await.unwrap();
        assert!(relay.is_energized());
        assert_eq!(board.output(26), Some(true));

        relay.apply(ActuatorCommand::SetRelay(false)).await.unwrap();
        assert_eq!(board.output(26), Some(false));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_state() {
        let board = MockBoard::new();
        let mut relay = Relay::new(&board.shared(), 26).unwrap();

        board.fail_pin(26);
        assert!(relay.apply(ActuatorCommand::SetRelay(true)).await.is_err());
        assert!(!relay.is_energized());
    }
}
