//! 1-Wire digital thermometer (DS18B20). One sensor per data pin.

use crate::board::{BoardRef, InstanceId, PinClaim};
use crate::error::{HardwareError, Result};
use crate::traits::PeripheralDevice;
use crate::types::Reading;
use sensorlink_core::PeripheralKind;

/// Value the sensor family reports when the probe is disconnected.
const DISCONNECTED_CELSIUS: f32 = -127.0;

#[derive(Debug)]
pub struct OneWireThermometer {
    instance: InstanceId,
    claim: PinClaim,
    data: u8,
}

impl OneWireThermometer {
    /// # Errors
    /// Returns `HardwareError::DeviceNotFound` when no presence pulse answers
    /// the bus reset.
    pub fn new(board: &BoardRef, data: u8) -> Result<Self> {
        let claim = PinClaim::acquire(board, &[data])?;

        if !board.one_wire_present(data) {
            return Err(HardwareError::not_found(format!(
                "1-Wire thermometer on pin {data}"
            )));
        }

        Ok(Self {
            instance: InstanceId::next(),
            claim,
            data,
        })
    }
}

impl PeripheralDevice for OneWireThermometer {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::OneWireTemperature
    }

    fn instance_id(&self) -> InstanceId {
        self.instance
    }

    fn pins(&self) -> &[u8] {
        self.claim.pins()
    }

    async fn read(&mut self) -> Result<Reading> {
        let celsius = self.claim.board().one_wire_temperature(self.data)?;
        if celsius <= DISCONNECTED_CELSIUS {
            return Err(HardwareError::communication(format!(
                "1-Wire thermometer on pin {} disconnected",
                self.data
            )));
        }
        Ok(Reading::new().with("temperature", celsius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBoard;
    use crate::types::ReadingValue;

    #[test]
    fn test_absent_probe_fails_construction() {
        let board = MockBoard::new();
        let result = OneWireThermometer::new(&board.shared(), 13);
        assert!(matches!(result, Err(HardwareError::DeviceNotFound { .. })));
        assert!(!board.is_claimed(13));
    }

    #[tokio::test]
    async fn test_reads_temperature() {
        let board = MockBoard::new();
        board.attach_one_wire(13, 21.25);
        let mut sensor = OneWireThermometer::new(&board.shared(), 13).unwrap();

        let reading = sensor.read().await.unwrap();
        assert_eq!(reading.get("temperature"), Some(&ReadingValue::Float(21.25)));
    }

    #[tokio::test]
    async fn test_disconnected_value_is_an_error() {
        let board = MockBoard::new();
        board.attach_one_wire(13, -127.0);
        let mut sensor = OneWireThermometer::new(&board.shared(), 13).unwrap();
        assert!(sensor.read().await.is_err());
    }
}
