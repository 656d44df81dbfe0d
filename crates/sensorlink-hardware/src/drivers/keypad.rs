//! 4x4 matrix keypad.
//!
//! Pin order: `[row0..row3, col0..col3]`. Rows are outputs idling high;
//! columns are inputs with pull-ups. A scan pulls one row low at a time and
//! looks for a column that follows it.
//!
//! ```text
//!          col0 col1 col2 col3
//!   row0    1    2    3    A
//!   row1    4    5    6    B
//!   row2    7    8    9    C
//!   row3    *    0    #    D
//! ```
//!
//! A key is reported once, on the scan where it goes down. Holding it
//! reports nothing until it is released and pressed again.

use crate::board::{BoardRef, InstanceId, PinClaim, PinMode};
use crate::error::{HardwareError, Result};
use crate::traits::{KeyScanner, PeripheralDevice};
use crate::types::Reading;
use sensorlink_core::PeripheralKind;
use sensorlink_core::constants::KEYPAD_LAYOUT;

const LINES: usize = 4;

#[derive(Debug)]
pub struct MatrixKeypad {
    instance: InstanceId,
    claim: PinClaim,
    rows: [u8; LINES],
    cols: [u8; LINES],
    held: Option<char>,
}

impl MatrixKeypad {
    /// # Errors
    /// Fails if a pin is taken or cannot be configured.
    pub fn new(board: &BoardRef, rows: [u8; LINES], cols: [u8; LINES]) -> Result<Self> {
        let pins: Vec<u8> = rows.iter().chain(cols.iter()).copied().collect();
        let claim = PinClaim::acquire(board, &pins)?;

        for row in rows {
            board.set_mode(row, PinMode::Output)?;
            board.digital_write(row, true)?;
        }
        for col in cols {
            board.set_mode(col, PinMode::InputPullUp)?;
        }

        Ok(Self {
            instance: InstanceId::next(),
            claim,
            rows,
            cols,
            held: None,
        })
    }

    /// Key currently down, if any.
    fn sample(&self) -> Result<Option<char>> {
        let board = self.claim.board();
        for (r, row) in self.rows.iter().enumerate() {
            board.digital_write(*row, false)?;
            let scanned = self.scan_columns(r);
            // the row goes back high even when a column read failed
            board.digital_write(*row, true)?;
            if let Some(key) = scanned? {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn scan_columns(&self, row: usize) -> Result<Option<char>> {
        let board = self.claim.board();
        for (c, col) in self.cols.iter().enumerate() {
            if !board.digital_read(*col)? {
                return Ok(Some(KEYPAD_LAYOUT[row][c]));
            }
        }
        Ok(None)
    }
}

impl PeripheralDevice for MatrixKeypad {
    fn kind(&self) -> PeripheralKind {
        PeripheralKind::MatrixKeypad
    }

    fn instance_id(&self) -> InstanceId {
        self.instance
    }

    fn pins(&self) -> &[u8] {
        self.claim.pins()
    }

    /// Keypads report through [`KeyScanner`]; bulk telemetry skips them.
    async fn read(&mut self) -> Result<Reading> {
        Err(HardwareError::unsupported("bulk read of a keypad"))
    }
}

impl KeyScanner for MatrixKeypad {
    async fn scan(&mut self) -> Result<Option<char>> {
        let down = self.sample()?;
        let pressed = match (self.held, down) {
            (Some(previous), Some(current)) if previous == current => None,
            (_, current) => current,
        };
        self.held = down;
        Ok(pressed)
    }
}
