//! Infrared obstacle detector. The module drives its output high on detection.

use crate::board::{BoardRef, InstanceId, PinClaim, PinMode};
use crate::error::Result;
use crate::traits::PeripheralDevice;
use crate::types::Reading;
use sensorlink_core::PeripheralKind;

#[derive(Debug)]
pub struct ObstacleDetector {
    instance: InstanceId,
    claim: PinClaim,
    pin: u8,
}

impl ObstacleDetector {
    /// # Errors
    /// Fails if the pin is taken or cannot be configured.
    pub fn new(board: &BoardRef, pin: u8) -> Result<Self> {
        let claim = PinClaim::acquire(board, &[pin])?;
        board.set_mode(pin, PinMode::Input)?;

        Ok(Self {
            instance: InstanceId::next(),
            claim,
            pin,
        })
    }
}

impl PeripheralDevice for ObstacleDetector {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::ObstacleDetector
    }

    fn instance_id(&self) -> InstanceId {
        self.instance
    }

    fn pins(&self) -> &[u8] {
        self.claim.pins()
    }

    async fn read(&mut self) -> Result<Reading> {
        let detected = self.claim.board().digital_read(self.pin)?;
        Ok(Reading::new().with("obstacle_detected", detected))
    }
}
