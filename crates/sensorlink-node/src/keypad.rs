//! Keypad entry buffers.
//!
//! Every keypad accumulates pressed keys until the submit key:
//!
//! ```text
//!  key '*'            → buffer cleared
//!  key '#', buffer "" → nothing
//!  key '#', buffer s  → s submitted, buffer cleared
//!  other key          → appended (dropped once the buffer is full)
//! ```

use sensorlink_core::SensorId;
use sensorlink_core::constants::{KEYPAD_BUFFER_CAPACITY, KEYPAD_CLEAR_KEY, KEYPAD_SUBMIT_KEY};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Pending input of one keypad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeypadBuffer {
    input: String,
}

impl KeypadBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one key. Returns the submitted input on `#` with a non-empty buffer.
    pub fn press(&mut self, key: char) -> Option<String> {
        match key {
            KEYPAD_CLEAR_KEY => {
                trace!("keypad buffer cleared");
                self.input.clear();
                None
            }
            KEYPAD_SUBMIT_KEY if self.input.is_empty() => None,
            KEYPAD_SUBMIT_KEY => Some(std::mem::take(&mut self.input)),
            key if self.input.chars().count() < KEYPAD_BUFFER_CAPACITY => {
                self.input.push(key);
                None
            }
            key => {
                debug!(%key, "keypad buffer full, key dropped");
                None
            }
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

/// Buffers of every configured keypad.
#[derive(Debug, Default)]
pub struct KeypadBuffers {
    buffers: HashMap<SensorId, KeypadBuffer>,
}

impl KeypadBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a key to the buffer of `id`.
    pub fn press(&mut self, id: SensorId, key: char) -> Option<String> {
        self.buffers.entry(id).or_default().press(key)
    }

    /// Discard buffers of keypads that are no longer configured.
    pub fn retain(&mut self, live: &[SensorId]) {
        self.buffers.retain(|id, _| live.contains(id));
    }

    pub fn get(&self, id: SensorId) -> Option<&KeypadBuffer> {
        self.buffers.get(&id)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn feed(keys: &str) -> (Vec<String>, KeypadBuffer) {
        let mut buffer = KeypadBuffer::new();
        let submitted = keys.chars().filter_map(|key| buffer.press(key)).collect();
        (submitted, buffer)
    }

    #[rstest]
    #[case("123#", vec!["123"], "")]
    #[case("1*2#", vec!["2"], "")]
    #[case("#", vec![], "")]
    #[case("*#", vec![], "")]
    #[case("12#34#", vec!["12", "34"], "")]
    #[case("AB", vec![], "AB")]
    fn test_sequences(#[case] keys: &str, #[case] submitted: Vec<&str>, #[case] pending: &str) {
        let (flushed, buffer) = feed(keys);
        assert_eq!(flushed, submitted);
        assert_eq!(buffer.input(), pending);
    }

    #[test]
    fn test_capacity() {
        let keys: String = std::iter::repeat_n('7', KEYPAD_BUFFER_CAPACITY + 10).collect();
        let (flushed, buffer) = feed(&keys);

        assert!(flushed.is_empty());
        assert_eq!(buffer.input().len(), KEYPAD_BUFFER_CAPACITY);
    }

    #[test]
    fn test_buffers_are_per_keypad() {
        let mut buffers = KeypadBuffers::new();
        let (a, b) = (SensorId::new(1), SensorId::new(2));

        buffers.press(a, '1');
        buffers.press(b, '9');
        assert_eq!(buffers.press(a, '#'), Some("1".to_string()));
        assert_eq!(buffers.get(b).unwrap().input(), "9");

        buffers.retain(&[a]);
        assert!(buffers.get(b).is_none());
        assert_eq!(buffers.len(), 1);
    }
}
