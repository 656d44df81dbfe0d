//! Mock board implementation for testing and development.
//!
//! [`MockBoard`] keeps the state of every pin and bus in memory. Drivers see a
//! regular [`Board`]; tests and the simulator use the same value (it is a
//! cheap clone of shared state) to set inputs and inspect outputs.
//!
//! # Examples
//!
//! ```
//! use sensorlink_hardware::board::{Board, PinMode};
//! use sensorlink_hardware::mock::MockBoard;
//!
//! let board = MockBoard::new();
//! let shared = board.shared();
//!
//! shared.set_mode(4, PinMode::Output).unwrap();
//! shared.digital_write(4, true).unwrap();
//! assert_eq!(board.output(4), Some(true));
//!
//! board.set_analog(34, 1234);
//! assert_eq!(shared.analog_read(34).unwrap(), 1234);
//! ```

use crate::board::{Board, BoardRef, PinMode};
use crate::error::{HardwareError, Result};
use sensorlink_core::constants::{ECHO_TIMEOUT_MS, KEYPAD_LAYOUT};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Register file size of a simulated I2C device.
const REGISTER_FILE_SIZE: usize = 256;

#[derive(Debug, Default)]
struct BoardState {
    claimed: HashSet<u8>,
    modes: HashMap<u8, PinMode>,
    outputs: HashMap<u8, bool>,
    inputs: HashMap<u8, bool>,
    analog: HashMap<u8, u16>,
    echoes: HashMap<u8, Duration>,
    pwm: HashMap<u8, u16>,
    i2c: HashMap<u8, Vec<u8>>,
    one_wire: HashMap<u8, f32>,
    dht: HashMap<u8, (f32, f32)>,
    pressed: HashSet<(u8, u8)>,
    failing: HashSet<u8>,
    fallback: Fallback,
}

/// Values answered by pins that were not configured individually.
#[derive(Debug, Default, Clone)]
pub(crate) struct Fallback {
    pub(crate) analog: Option<u16>,
    pub(crate) echo: Option<Duration>,
    pub(crate) one_wire: Option<f32>,
    pub(crate) dht: Option<(f32, f32)>,
}

/// In-memory board.
///
/// Cloning yields another view of the same state.
#[derive(Debug, Clone, Default)]
pub struct MockBoard {
    state: Arc<Mutex<BoardState>>,
}

impl MockBoard {
    /// Create a board with nothing attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Board handle to give to drivers.
    pub fn shared(&self) -> BoardRef {
        Arc::new(self.clone())
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_fallback(&self, fallback: Fallback) {
        self.lock().fallback = fallback;
    }

    /// Whether a live claim holds `pin`.
    pub fn is_claimed(&self, pin: u8) -> bool {
        self.lock().claimed.contains(&pin)
    }

    /// Number of pins currently claimed.
    pub fn claimed_count(&self) -> usize {
        self.lock().claimed.len()
    }

    /// Configured mode of `pin`.
    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.lock().modes.get(&pin).copied()
    }

    /// Last level written to an output pin.
    pub fn output(&self, pin: u8) -> Option<bool> {
        self.lock().outputs.get(&pin).copied()
    }

    /// Force the level seen by `digital_read` on `pin`.
    pub fn set_input(&self, pin: u8, high: bool) {
        self.lock().inputs.insert(pin, high);
    }

    /// Set the ADC value of `pin`.
    pub fn set_analog(&self, pin: u8, value: u16) {
        self.lock().analog.insert(pin, value);
    }

    /// Set the echo pulse width answered on `pin`; `None` simulates no echo.
    pub fn set_echo(&self, pin: u8, width: Option<Duration>) {
        let mut state = self.lock();
        match width {
            Some(width) => state.echoes.insert(pin, width),
            None => state.echoes.remove(&pin),
        };
    }

    /// Set the echo so that the raw ultrasonic distance equals `cm`.
    pub fn set_echo_for_distance(&self, pin: u8, cm: f64) {
        let micros = (cm * 2.0 / f64::from(sensorlink_core::constants::SOUND_SPEED_CM_PER_US)).round();
        self.set_echo(pin, Some(Duration::from_micros(micros as u64)));
    }

    /// Last PWM pulse width written to `pin`.
    pub fn pwm(&self, pin: u8) -> Option<u16> {
        self.lock().pwm.get(&pin).copied()
    }

    /// Attach a device answering at `address` with an all-zero register file.
    pub fn attach_i2c(&self, address: u8) {
        self.lock()
            .i2c
            .entry(address)
            .or_insert_with(|| vec![0; REGISTER_FILE_SIZE]);
    }

    /// Remove the device at `address`.
    pub fn detach_i2c(&self, address: u8) {
        self.lock().i2c.remove(&address);
    }

    /// Write registers of an attached device as the device itself would.
    pub fn set_registers(&self, address: u8, register: u8, data: &[u8]) {
        let mut state = self.lock();
        if let Some(registers) = state.i2c.get_mut(&address) {
            let start = usize::from(register);
            let end = (start + data.len()).min(REGISTER_FILE_SIZE);
            registers[start..end].copy_from_slice(&data[..end - start]);
        }
    }

    /// Read back one register of an attached device.
    pub fn register(&self, address: u8, register: u8) -> Option<u8> {
        self.lock()
            .i2c
            .get(&address)
            .map(|registers| registers[usize::from(register)])
    }

    /// Attach a 1-Wire temperature sensor to `pin`.
    pub fn attach_one_wire(&self, pin: u8, celsius: f32) {
        self.lock().one_wire.insert(pin, celsius);
    }

    /// Attach a DHT sensor to `pin`.
    pub fn attach_dht(&self, pin: u8, celsius: f32, humidity: f32) {
        self.lock().dht.insert(pin, (celsius, humidity));
    }

    /// Connect a keypad row line to a column line.
    pub fn press(&self, row_pin: u8, col_pin: u8) {
        self.lock().pressed.insert((row_pin, col_pin));
    }

    /// Disconnect every row/column pair.
    pub fn release_all(&self) {
        self.lock().pressed.clear();
    }

    /// Press `key` on a keypad wired to `rows` and `cols`.
    ///
    /// Returns `false` if the key is not part of the layout.
    pub fn press_key(&self, rows: &[u8], cols: &[u8], key: char) -> bool {
        for (r, row) in KEYPAD_LAYOUT.iter().enumerate() {
            if let Some(c) = row.iter().position(|k| *k == key)
                && let (Some(row_pin), Some(col_pin)) = (rows.get(r), cols.get(c))
            {
                self.press(*row_pin, *col_pin);
                return true;
            }
        }
        false
    }

    /// Make every operation on `pin` fail.
    pub fn fail_pin(&self, pin: u8) {
        self.lock().failing.insert(pin);
    }

    /// Undo [`fail_pin`](Self::fail_pin).
    pub fn heal_pin(&self, pin: u8) {
        self.lock().failing.remove(&pin);
    }

    fn check(state: &BoardState, pin: u8) -> Result<()> {
        if state.failing.contains(&pin) {
            return Err(HardwareError::communication(format!("pin {pin} not responding")));
        }
        Ok(())
    }
}

impl Board for MockBoard {
    fn claim_pins(&self, pins: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if let Some(pin) = pins.iter().find(|pin| state.claimed.contains(pin)) {
            return Err(HardwareError::pin_in_use(*pin));
        }
        state.claimed.extend(pins.iter().copied());
        Ok(())
    }

    fn release_pins(&self, pins: &[u8]) {
        let mut state = self.lock();
        for pin in pins {
            state.claimed.remove(pin);
            state.modes.remove(pin);
        }
    }

    fn set_mode(&self, pin: u8, mode: PinMode) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, pin)?;
        state.modes.insert(pin, mode);
        Ok(())
    }

    fn digital_write(&self, pin: u8, high: bool) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, pin)?;
        state.outputs.insert(pin, high);
        Ok(())
    }

    fn digital_read(&self, pin: u8) -> Result<bool> {
        let state = self.lock();
        Self::check(&state, pin)?;

        if let Some(level) = state.inputs.get(&pin) {
            return Ok(*level);
        }

        if state.modes.get(&pin) == Some(&PinMode::InputPullUp) {
            let pulled_low = state
                .pressed
                .iter()
                .any(|(row, col)| *col == pin && state.outputs.get(row) == Some(&false));
            return Ok(!pulled_low);
        }

        Ok(false)
    }

    fn analog_read(&self, pin: u8) -> Result<u16> {
        let state = self.lock();
        Self::check(&state, pin)?;
        Ok(state
            .analog
            .get(&pin)
            .copied()
            .or(state.fallback.analog)
            .unwrap_or(0))
    }

    fn pulse_in(&self, pin: u8, timeout: Duration) -> Result<Option<Duration>> {
        let state = self.lock();
        Self::check(&state, pin)?;
        let width = state.echoes.get(&pin).copied().or(state.fallback.echo);
        Ok(width.filter(|w| *w <= timeout.min(Duration::from_millis(ECHO_TIMEOUT_MS))))
    }

    fn pwm_write(&self, pin: u8, pulse_width_us: u16) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, pin)?;
        state.pwm.insert(pin, pulse_width_us);
        Ok(())
    }

    fn i2c_probe(&self, address: u8) -> bool {
        self.lock().i2c.contains_key(&address)
    }

    fn i2c_read(&self, address: u8, register: u8, buffer: &mut [u8]) -> Result<()> {
        let state = self.lock();
        let registers = state
            .i2c
            .get(&address)
            .ok_or_else(|| HardwareError::communication(format!("no ACK from 0x{address:02X}")))?;

        let start = usize::from(register);
        if start + buffer.len() > REGISTER_FILE_SIZE {
            return Err(HardwareError::invalid_data("register read past end of device"));
        }
        buffer.copy_from_slice(&registers[start..start + buffer.len()]);
        Ok(())
    }

    fn i2c_write(&self, address: u8, register: u8, data: &[u8]) -> Result<()> {
        let mut state = self.lock();
        let registers = state
            .i2c
            .get_mut(&address)
            .ok_or_else(|| HardwareError::communication(format!("no ACK from 0x{address:02X}")))?;

        let start = usize::from(register);
        if start + data.len() > REGISTER_FILE_SIZE {
            return Err(HardwareError::invalid_data("register write past end of device"));
        }
        registers[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn one_wire_present(&self, pin: u8) -> bool {
        let state = self.lock();
        !state.failing.contains(&pin)
            && (state.one_wire.contains_key(&pin) || state.fallback.one_wire.is_some())
    }

    fn one_wire_temperature(&self, pin: u8) -> Result<f32> {
        let state = self.lock();
        Self::check(&state, pin)?;
        state
            .one_wire
            .get(&pin)
            .copied()
            .or(state.fallback.one_wire)
            .ok_or_else(|| HardwareError::not_found(format!("1-Wire sensor on pin {pin}")))
    }

    fn dht_read(&self, pin: u8) -> Result<(f32, f32)> {
        let state = self.lock();
        Self::check(&state, pin)?;
        state
            .dht
            .get(&pin)
            .copied()
            .or(state.fallback.dht)
            .ok_or_else(|| HardwareError::timeout(ECHO_TIMEOUT_MS))
    }
}
