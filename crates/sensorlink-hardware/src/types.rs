//! Reading values produced by drivers.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// One scalar inside a reading.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ReadingValue {
    /// Numeric view of the value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Integer view of the value, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl Serialize for ReadingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Text(v) => serializer.serialize_str(v),
        }
    }
}

impl From<i64> for ReadingValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u16> for ReadingValue {
    fn from(v: u16) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u8> for ReadingValue {
    fn from(v: u8) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<bool> for ReadingValue {
    fn from(v: bool) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for ReadingValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for ReadingValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<String> for ReadingValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Flat, ordered key/value set produced by one `read()`.
///
/// Serializes as a JSON object with keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    values: Vec<(&'static str, ReadingValue)>,
}

impl Reading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl Into<ReadingValue>) -> Self {
        self.values.push((key, value.into()));
        self
    }

    /// Look a value up by key.
    pub fn get(&self, key: &str) -> Option<&ReadingValue> {
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.values {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            match value {
                ReadingValue::Int(v) => write!(f, "{key}={v}")?,
                ReadingValue::Float(v) => write!(f, "{key}={v:.2}")?,
                ReadingValue::Text(v) => write!(f, "{key}={v:?}")?,
            }
        }
        Ok(())
    }
}
