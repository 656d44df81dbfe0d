//! Six-axis accelerometer/gyroscope on the shared I2C bus (MPU-6050 family).
//!
//! An optional address-select pin moves the device from 0x68 to 0x69.

use crate::board::{BoardRef, InstanceId, PinClaim, PinMode};
use crate::error::{HardwareError, Result};
use crate::traits::PeripheralDevice;
use crate::types::Reading;
use sensorlink_core::PeripheralKind;
use sensorlink_core::constants::{ACCELEROMETER_ADDRESS, ACCELEROMETER_ALT_ADDRESS};
use tracing::debug;

pub(crate) mod registers {
    pub const CONFIG: u8 = 0x1A;
    pub const GYRO_CONFIG: u8 = 0x1B;
    pub const ACCEL_CONFIG: u8 = 0x1C;
    pub const ACCEL_XOUT_H: u8 = 0x3B;
    pub const PWR_MGMT_1: u8 = 0x6B;
    pub const WHO_AM_I: u8 = 0x75;
}

const STANDARD_GRAVITY: f64 = 9.806_65;

/// Accelerometer full scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccelRange {
    G2,
    G4,
    #[default]
    G8,
    G16,
}

impl AccelRange {
    /// Decode a full scale in g; anything else selects the default.
    pub fn from_g(g: i32) -> Self {
        match g {
            2 => Self::G2,
            4 => Self::G4,
            8 => Self::G8,
            16 => Self::G16,
            _ => Self::default(),
        }
    }

    fn config_bits(self) -> u8 {
        (self as u8) << 3
    }

    fn lsb_per_g(self) -> f64 {
        match self {
            Self::G2 => 16384.0,
            Self::G4 => 8192.0,
            Self::G8 => 4096.0,
            Self::G16 => 2048.0,
        }
    }
}

/// Gyroscope full scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GyroRange {
    Dps250,
    #[default]
    Dps500,
    Dps1000,
    Dps2000,
}

impl GyroRange {
    /// Decode a full scale in degrees per second; anything else selects the default.
    pub fn from_dps(dps: i32) -> Self {
        match dps {
            250 => Self::Dps250,
            500 => Self::Dps500,
            1000 => Self::Dps1000,
            2000 => Self::Dps2000,
            _ => Self::default(),
        }
    }

    fn config_bits(self) -> u8 {
        (self as u8) << 3
    }

    fn lsb_per_dps(self) -> f64 {
        match self {
            Self::Dps250 => 131.0,
            Self::Dps500 => 65.5,
            Self::Dps1000 => 32.8,
            Self::Dps2000 => 16.4,
        }
    }
}

/// Digital low-pass filter bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterBandwidth {
    Hz260,
    Hz184,
    Hz94,
    Hz44,
    Hz21,
    Hz10,
    #[default]
    Hz5,
}

impl FilterBandwidth {
    /// Decode a bandwidth in Hz; anything else selects the default.
    pub fn from_hz(hz: i32) -> Self {
        match hz {
            260 => Self::Hz260,
            184 => Self::Hz184,
            94 => Self::Hz94,
            44 => Self::Hz44,
            21 => Self::Hz21,
            10 => Self::Hz10,
            _ => Self::default(),
        }
    }
}

/// Range settings taken from the descriptor attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccelerometerSettings {
    pub accel_range: AccelRange,
    pub gyro_range: GyroRange,
    pub bandwidth: FilterBandwidth,
}

impl AccelerometerSettings {
    /// attr1 = g, attr2 = deg/s, attr3 = Hz.
    pub fn from_attributes(attr1: i32, attr2: i32, attr3: i32) -> Self {
        Self {
            accel_range: AccelRange::from_g(attr1),
            gyro_range: GyroRange::from_dps(attr2),
            bandwidth: FilterBandwidth::from_hz(attr3),
        }
    }
}

#[derive(Debug)]
pub struct Accelerometer {
    instance: InstanceId,
    claim: PinClaim,
    address: u8,
    settings: AccelerometerSettings,
}

impl Accelerometer {
    /// Wake the device and program its ranges.
    ///
    /// # Errors
    /// Returns `HardwareError::DeviceNotFound` if nothing acknowledges the address.
    pub fn new(
        board: &BoardRef,
        select_pin: Option<u8>,
        settings: AccelerometerSettings,
    ) -> Result<Self> {
        let claim = PinClaim::acquire(board, select_pin.as_slice())?;

        let address = match select_pin {
            Some(pin) => {
                board.set_mode(pin, PinMode::Output)?;
                board.digital_write(pin, true)?;
                ACCELEROMETER_ALT_ADDRESS
            }
            None => ACCELEROMETER_ADDRESS,
        };

        if !board.i2c_probe(address) {
            return Err(HardwareError::not_found(format!(
                "accelerometer at 0x{address:02X}"
            )));
        }

        board.i2c_write(address, registers::PWR_MGMT_1, &[0x00])?;
        board.i2c_write(address, registers::ACCEL_CONFIG, &[settings.accel_range.config_bits()])?;
        board.i2c_write(address, registers::GYRO_CONFIG, &[settings.gyro_range.config_bits()])?;
        board.i2c_write(address, registers::CONFIG, &[settings.bandwidth as u8])?;

        debug!(address, ?settings, "accelerometer ready");

        Ok(Self {
            instance: InstanceId::next(),
            claim,
            address,
            settings,
        })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn settings(&self) -> AccelerometerSettings {
        self.settings
    }
}

impl PeripheralDevice for Accelerometer {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::Accelerometer
    }

    fn instance_id(&self) -> InstanceId {
        self.instance
    }

    fn pins(&self) -> &[u8] {
        self.claim.pins()
    }

    async fn read(&mut self) -> Result<Reading> {
        let mut raw = [0u8; 14];
        self.claim
            .board()
            .i2c_read(self.address, registers::ACCEL_XOUT_H, &mut raw)?;

        let word = |i: usize| f64::from(i16::from_be_bytes([raw[i], raw[i + 1]]));
        let accel = |i: usize| word(i) / self.settings.accel_range.lsb_per_g() * STANDARD_GRAVITY;
        let gyro = |i: usize| (word(i) / self.settings.gyro_range.lsb_per_dps()).to_radians();

        Ok(Reading::new()
            .with("accel_x", accel(0))
            .with("accel_y", accel(2))
            .with("accel_z", accel(4))
            .with("gyro_x", gyro(8))
            .with("gyro_y", gyro(10))
            .with("gyro_z", gyro(12))
            .with("temp", word(6) / 340.0 + 36.53))
    }
}
