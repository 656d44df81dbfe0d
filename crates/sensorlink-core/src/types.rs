use crate::{
    Result,
    constants::{BATCH_KEY, DEFAULT_DEVICE_ID, RESERVED_TOPIC_CHARS},
    error::Error,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::RangeInclusive;

/// Stable external identifier of a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(i64);

impl SensorId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw identifier.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for SensorId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i32> for SensorId {
    fn from(id: i32) -> Self {
        Self(i64::from(id))
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node identifier, used as the root segment of every topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a new device id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidDeviceId` if the id is empty, contains
    /// whitespace, or contains an MQTT separator or wildcard.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidDeviceId("device id must not be empty".to_string()));
        }
        if id.chars().any(|c| c.is_whitespace() || RESERVED_TOPIC_CHARS.contains(&c)) {
            return Err(Error::InvalidDeviceId(format!(
                "device id must not contain whitespace, '/', '+' or '#': {id}"
            )));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self(DEFAULT_DEVICE_ID.to_string())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceId::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        DeviceId::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

/// Closed set of supported peripheral kinds.
///
/// The numeric wire codes follow the firmware's `tipo` enumeration; code 8
/// (infrared receiver) is not supported and decodes as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PeripheralKind {
    Accelerometer,
    OneWireTemperature,
    DistanceSensor,
    ColorGestureProximity,
    ServoActuator,
    RelayActuator,
    AnalogJoystick,
    MatrixKeypad,
    ObstacleDetector,
    TemperatureHumidity,
}

impl PeripheralKind {
    /// Every kind, in wire code order.
    pub const ALL: [PeripheralKind; 10] = [
        Self::Accelerometer,
        Self::OneWireTemperature,
        Self::DistanceSensor,
        Self::ColorGestureProximity,
        Self::ServoActuator,
        Self::RelayActuator,
        Self::AnalogJoystick,
        Self::MatrixKeypad,
        Self::ObstacleDetector,
        Self::TemperatureHumidity,
    ];

    /// Numeric code used on the wire and in the snapshot.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Accelerometer => 0,
            Self::OneWireTemperature => 1,
            Self::DistanceSensor => 2,
            Self::ColorGestureProximity => 3,
            Self::ServoActuator => 4,
            Self::RelayActuator => 5,
            Self::AnalogJoystick => 6,
            Self::MatrixKeypad => 7,
            Self::ObstacleDetector => 9,
            Self::TemperatureHumidity => 10,
        }
    }

    /// Decode a wire code.
    ///
    /// # Errors
    /// Returns `Error::UnknownKind` for codes outside the table.
    pub fn from_code(code: i64) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or(Error::UnknownKind(code))
    }

    /// Number of pins the kind's driver accepts.
    #[must_use]
    pub const fn pin_arity(&self) -> RangeInclusive<usize> {
        match self {
            Self::Accelerometer => 0..=1,
            Self::DistanceSensor => 2..=2,
            Self::TemperatureHumidity => 1..=1,
            Self::OneWireTemperature => 1..=1,
            Self::ColorGestureProximity => 0..=1,
            Self::ServoActuator => 1..=1,
            Self::RelayActuator => 1..=1,
            Self::AnalogJoystick => 3..=3,
            Self::MatrixKeypad => 8..=8,
            Self::ObstacleDetector => 1..=1,
        }
    }

    /// Kinds whose same-kind updates never recreate the driver.
    #[must_use]
    pub const fn updates_in_place(&self) -> bool {
        matches!(
            self,
            Self::ServoActuator | Self::RelayActuator | Self::DistanceSensor
        )
    }
}

impl TryFrom<i64> for PeripheralKind {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        Self::from_code(code)
    }
}

impl From<PeripheralKind> for i64 {
    fn from(kind: PeripheralKind) -> Self {
        kind.code()
    }
}

impl fmt::Display for PeripheralKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Accelerometer => "Accelerometer",
            Self::OneWireTemperature => "OneWireTemperature",
            Self::DistanceSensor => "DistanceSensor",
            Self::ColorGestureProximity => "ColorGestureProximity",
            Self::ServoActuator => "ServoActuator",
            Self::RelayActuator => "RelayActuator",
            Self::AnalogJoystick => "AnalogJoystick",
            Self::MatrixKeypad => "MatrixKeypad",
            Self::ObstacleDetector => "ObstacleDetector",
            Self::TemperatureHumidity => "TemperatureHumidity",
        };
        f.write_str(name)
    }
}

/// Electrical role of one pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PinRole {
    #[default]
    Disabled,
    DigitalInput,
    DigitalOutput,
    Analog,
    I2cClock,
    I2cData,
    OneWire,
}

impl PinRole {
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Disabled => 0,
            Self::DigitalInput => 1,
            Self::DigitalOutput => 2,
            Self::Analog => 3,
            Self::I2cClock => 4,
            Self::I2cData => 5,
            Self::OneWire => 6,
        }
    }
}

impl TryFrom<i64> for PinRole {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::DigitalInput),
            2 => Ok(Self::DigitalOutput),
            3 => Ok(Self::Analog),
            4 => Ok(Self::I2cClock),
            5 => Ok(Self::I2cData),
            6 => Ok(Self::OneWire),
            other => Err(Error::UnknownPinRole(other)),
        }
    }
}

impl From<PinRole> for i64 {
    fn from(role: PinRole) -> Self {
        role.code()
    }
}

/// One pin of a peripheral's wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinAssignment {
    #[serde(rename = "pino")]
    pub pin: u8,

    #[serde(rename = "tipo", default)]
    pub role: PinRole,
}

impl PinAssignment {
    #[must_use]
    pub const fn new(pin: u8, role: PinRole) -> Self {
        Self { pin, role }
    }
}

/// Serializable record describing one peripheral.
///
/// Field names on the wire (and in the snapshot) are `id`, `tipo`, `desc`,
/// `atributo1`..`atributo4` and `pinos`. Pin order is positional and part of
/// the contract with the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralDescriptor {
    pub id: SensorId,

    #[serde(rename = "tipo")]
    pub kind: PeripheralKind,

    #[serde(rename = "desc", default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(rename = "atributo1", default, deserialize_with = "null_as_default")]
    pub attr1: i32,

    #[serde(rename = "atributo2", default, deserialize_with = "null_as_default")]
    pub attr2: i32,

    #[serde(rename = "atributo3", default, deserialize_with = "null_as_default")]
    pub attr3: i32,

    #[serde(rename = "atributo4", default, deserialize_with = "null_as_default")]
    pub attr4: i32,

    #[serde(rename = "pinos", default, deserialize_with = "null_as_default")]
    pub pins: Vec<PinAssignment>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl PeripheralDescriptor {
    /// Create a descriptor with empty description, zero attributes and no pins.
    #[must_use]
    pub fn new(id: impl Into<SensorId>, kind: PeripheralKind) -> Self {
        Self {
            id: id.into(),
            kind,
            description: String::new(),
            attr1: 0,
            attr2: 0,
            attr3: 0,
            attr4: 0,
            pins: Vec::new(),
        }
    }

    /// Set the human description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a pin.
    #[must_use]
    pub fn with_pin(mut self, pin: u8, role: PinRole) -> Self {
        self.pins.push(PinAssignment::new(pin, role));
        self
    }

    /// Set the four generic attributes.
    #[must_use]
    pub fn with_attributes(mut self, attr1: i32, attr2: i32, attr3: i32, attr4: i32) -> Self {
        self.attr1 = attr1;
        self.attr2 = attr2;
        self.attr3 = attr3;
        self.attr4 = attr4;
        self
    }

    /// Decode one descriptor from an already parsed JSON value.
    ///
    /// # Errors
    /// - `Error::Decode` if the value is not an object or a field has the wrong type
    /// - `Error::MissingField` if `id` or `tipo` is absent
    /// - `Error::UnknownKind` if `tipo` is not a known code
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::Decode("descriptor must be a JSON object".to_string()))?;

        for field in ["id", "tipo"] {
            if object.get(field).is_none_or(Value::is_null) {
                return Err(Error::MissingField(field.to_string()));
            }
        }

        if let Some(code) = object.get("tipo").and_then(Value::as_i64) {
            PeripheralKind::from_code(code)?;
        }

        Self::deserialize(value).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Check the pin count against the kind's arity.
    ///
    /// # Errors
    /// Returns `Error::InvalidPinCount` when the count is outside the range.
    pub fn validate(&self) -> Result<()> {
        let arity = self.kind.pin_arity();
        if !arity.contains(&self.pins.len()) {
            let expected = if arity.start() == arity.end() {
                arity.start().to_string()
            } else {
                format!("{}-{}", arity.start(), arity.end())
            };
            return Err(Error::InvalidPinCount {
                kind: self.kind,
                expected,
                actual: self.pins.len(),
            });
        }
        Ok(())
    }

    /// Whether both descriptors wire the same pins in the same order.
    #[must_use]
    pub fn same_wiring(&self, other: &Self) -> bool {
        self.pins == other.pins
    }

    /// Pin numbers in positional order.
    #[must_use]
    pub fn pin_numbers(&self) -> Vec<u8> {
        self.pins.iter().map(|p| p.pin).collect()
    }
}

/// Items of a set request: each entry is either a decoded descriptor or the
/// reason it could not be decoded.
pub type DecodedBatch = Vec<Result<PeripheralDescriptor>>;

/// Decode a set request payload.
///
/// A payload carrying an array under `"sensors"` is a batch; any other object
/// is a single descriptor. Malformed entries do not stop decoding of the rest.
///
/// # Errors
/// Returns `Error::Json` if the payload is not JSON, `Error::Decode` if it is
/// not an object.
pub fn decode_set_payload(payload: &[u8]) -> Result<DecodedBatch> {
    let value: Value = serde_json::from_slice(payload)?;
    decode_set_value(&value)
}

/// Decode an already parsed set request.
///
/// # Errors
/// Returns `Error::Decode` if the value is not an object or its batch key
/// does not hold an array.
pub fn decode_set_value(value: &Value) -> Result<DecodedBatch> {
    match value {
        Value::Object(object) => match object.get(BATCH_KEY) {
            Some(Value::Array(items)) => Ok(items.iter().map(PeripheralDescriptor::from_value).collect()),
            Some(_) => Err(Error::Decode(format!("'{BATCH_KEY}' must be an array"))),
            None => Ok(vec![PeripheralDescriptor::from_value(value)]),
        },
        _ => Err(Error::Decode("payload must be a JSON object".to_string())),
    }
}
