//! Single-wire temperature/humidity sensor (DHT11).

use crate::board::{BoardRef, InstanceId, PinClaim, PinMode};
use crate::error::Result;
use crate::traits::PeripheralDevice;
use crate::types::Reading;
use sensorlink_core::PeripheralKind;

#[derive(Debug)]
pub struct ClimateSensor {
    instance: InstanceId,
    claim: PinClaim,
    data: u8,
}

impl ClimateSensor {
    /// # Errors
    /// Fails if the data pin is taken or cannot be configured.
    pub fn new(board: &BoardRef, data: u8) -> Result<Self> {
        let claim = PinClaim::acquire(board, &[data])?;
        board.set_mode(data, PinMode::InputPullUp)?;

        Ok(Self {
            instance: InstanceId::next(),
            claim,
            data,
        })
    }
}

impl PeripheralDevice for ClimateSensor {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::TemperatureHumidity
    }

    fn instance_id(&self) -> InstanceId {
        self.instance
    }

    fn pins(&self) -> &[u8] {
        self.claim.pins()
    }

    /// NaN channels (checksum failures) are reported as 0.
    async fn read(&mut self) -> Result<Reading> {
        let (temperature, humidity) = self.claim.board().dht_read(self.data)?;
        let finite_or_zero = |v: f32| if v.is_nan() { 0.0 } else { v };

        Ok(Reading::new()
            .with("temperature", finite_or_zero(temperature))
            .with("humidity", finite_or_zero(humidity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBoard;
    use crate::types::ReadingValue;

    #[tokio::test]
    async fn test_reads_both_channels() {
        let board = MockBoard::new();
        board.attach_dht(14, 23.5, 61.0);
        let mut sensor = ClimateSensor::new(&board.shared(), 14).unwrap();

        let reading = sensor.read().await.unwrap();
        assert_eq!(reading.get("temperature"), Some(&ReadingValue::Float(23.5)));
        assert_eq!(reading.get("humidity"), Some(&ReadingValue::Float(61.0)));
    }

    #[tokio::test]
    async fn test_nan_reported_as_zero() {
        let board = MockBoard::new();
        board.attach_dht(14, f32::NAN, 40.0);
        let mut sensor = ClimateSensor::new(&board.shared(), 14).unwrap();

        let reading = sensor.read().await.unwrap();
        assert_eq!(reading.get("temperature"), Some(&ReadingValue::Float(0.0)));
    }

    #[tokio::test]
    async fn test_silent_sensor_is_an_error() {
        let board = MockBoard::new();
        let mut sensor = ClimateSensor::new(&board.shared(), 14).unwrap();
        assert!(sensor.read().await.is_err());
    }
}
