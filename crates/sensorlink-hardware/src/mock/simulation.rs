//! Simulated environment for running a node without hardware.
//!
//! A simulated board answers on every pin and every supported bus address
//! with slowly varying plausible values. [`MockBoard::animate`] advances the
//! simulated world to a point in time.

use super::board::{Fallback, MockBoard};
use crate::drivers::accelerometer::registers as mpu;
use crate::drivers::color::registers as apds;
use sensorlink_core::constants::{
    ACCELEROMETER_ADDRESS, ACCELEROMETER_ALT_ADDRESS, COLOR_SENSOR_ADDRESS, SOUND_SPEED_CM_PER_US,
};
use std::time::Duration;

impl MockBoard {
    /// Board with every supported device attached and fallback values on
    /// every pin.
    pub fn simulated() -> Self {
        let board = Self::new();
        for address in [ACCELEROMETER_ADDRESS, ACCELEROMETER_ALT_ADDRESS] {
            board.attach_i2c(address);
            board.set_registers(address, mpu::WHO_AM_I, &[ACCELEROMETER_ADDRESS]);
        }
        board.attach_i2c(COLOR_SENSOR_ADDRESS);
        board.set_registers(COLOR_SENSOR_ADDRESS, apds::ID, &[apds::DEVICE_ID]);
        board.animate(0.0);
        board
    }

    /// Move the simulated environment to `t` seconds.
    pub fn animate(&self, t: f64) {
        let wave = |period: f64| (t * std::f64::consts::TAU / period).sin();

        let distance_cm = 50.0 + 30.0 * wave(40.0);
        let echo_us = distance_cm * 2.0 / f64::from(SOUND_SPEED_CM_PER_US);

        self.set_fallback(Fallback {
            analog: Some((2048.0 + 1800.0 * wave(12.0)) as u16),
            echo: Some(Duration::from_micros(echo_us as u64)),
            one_wire: Some((22.0 + 3.0 * wave(300.0)) as f32),
            dht: Some(((24.0 + 2.0 * wave(600.0)) as f32, (55.0 + 10.0 * wave(900.0)) as f32)),
        });

        // Accelerometer at rest with a slight wobble; 8G range scale.
        let lsb_per_g = 4096.0;
        let sample = [
            0.02 * wave(3.0) * lsb_per_g,
            0.02 * wave(5.0) * lsb_per_g,
            lsb_per_g,
            (25.0 - 36.53) * 340.0,
            50.0 * wave(7.0),
            50.0 * wave(11.0),
            0.0,
        ];
        let mut bytes = Vec::with_capacity(sample.len() * 2);
        for value in sample {
            bytes.extend_from_slice(&(value as i16).to_be_bytes());
        }
        for address in [ACCELEROMETER_ADDRESS, ACCELEROMETER_ALT_ADDRESS] {
            self.set_registers(address, mpu::ACCEL_XOUT_H, &bytes);
        }

        let channel = |phase: f64| ((1.0 + wave(20.0 + phase)) * 8000.0) as u16;
        let mut color = Vec::with_capacity(8);
        for value in [channel(0.0) / 2 + channel(3.0) / 2, channel(0.0), channel(3.0), channel(7.0)] {
            color.extend_from_slice(&value.to_le_bytes());
        }
        self.set_registers(COLOR_SENSOR_ADDRESS, apds::CDATAL, &color);
        self.set_registers(
            COLOR_SENSOR_ADDRESS,
            apds::PDATA,
            &[((1.0 + wave(15.0)) * 100.0) as u8],
        );
    }
}
