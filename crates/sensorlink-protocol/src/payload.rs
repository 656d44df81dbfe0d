//! JSON payloads exchanged with the broker.

use sensorlink_core::{DeviceId, Error, PeripheralDescriptor, PeripheralKind, Result, SensorId};
use sensorlink_hardware::Reading;
use serde::Serialize;
use serde_json::Value;

/// One telemetry message: `{device_id, sensor_id, type, values}`.
///
/// `type` is the numeric kind code.
#[derive(Debug, Serialize)]
pub struct Telemetry<'a> {
    pub device_id: &'a str,
    pub sensor_id: SensorId,
    #[serde(rename = "type")]
    pub kind: i64,
    pub values: &'a Reading,
}

impl<'a> Telemetry<'a> {
    pub fn new(
        device: &'a DeviceId,
        sensor_id: SensorId,
        kind: PeripheralKind,
        values: &'a Reading,
    ) -> Self {
        Self {
            device_id: device.as_str(),
            sensor_id,
            kind: kind.code(),
            values,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Liveness message: `{mac, ip, id, timestamp}`.
///
/// `timestamp` is the node's uptime in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heartbeat {
    pub mac: String,
    pub ip: String,
    pub id: String,
    pub timestamp: u64,
}

impl Heartbeat {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Reply to a get request: every descriptor in snapshot format.
pub fn encode_descriptor_list(descriptors: &[PeripheralDescriptor]) -> serde_json::Result<String> {
    serde_json::to_string(descriptors)
}

/// Ids named by a remove request.
///
/// Accepts `{"id": n}` or `[{"id": n}, ...]`. Array items without an integer
/// `id` are skipped.
///
/// # Errors
/// - `Error::Json`: not JSON
/// - `Error::MissingField`: a single object without an integer `id`
/// - `Error::Decode`: anything but an object or an array
pub fn decode_remove_payload(payload: &[u8]) -> Result<Vec<SensorId>> {
    let value: Value = serde_json::from_slice(payload)?;
    match &value {
        Value::Object(_) => id_of(&value)
            .map(|id| vec![id])
            .ok_or_else(|| Error::MissingField("id".to_string())),
        Value::Array(items) => Ok(items.iter().filter_map(id_of).collect()),
        _ => Err(Error::Decode(
            "remove payload must be an object or an array".to_string(),
        )),
    }
}

fn id_of(value: &Value) -> Option<SensorId> {
    value.get("id").and_then(Value::as_i64).map(SensorId::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use sensorlink_core::PinRole;

    #[test]
    fn test_telemetry_shape() {
        let device = DeviceId::new("ESP32_005").unwrap();
        let reading = Reading::new().with("distance", 12.5).with("state", 1i64);
        let telemetry = Telemetry::new(
            &device,
            SensorId::new(4),
            PeripheralKind::DistanceSensor,
            &reading,
        );

        let json: Value = serde_json::from_str(&telemetry.to_json().unwrap()).unwrap();
        assert_eq!(json["device_id"], "ESP32_005");
        assert_eq!(json["sensor_id"], 4);
        assert_eq!(json["type"], 2);
        assert_eq!(json["values"]["distance"], 12.5);
        assert_eq!(json["values"]["state"], 1);
    }

    #[test]
    fn test_heartbeat_shape() {
        let heartbeat = Heartbeat {
            mac: "24:6F:28:00:00:01".to_string(),
            ip: "10.0.0.7".to_string(),
            id: "ESP32_005".to_string(),
            timestamp: 42,
        };
        let json: Value = serde_json::from_str(&heartbeat.to_json().unwrap()).unwrap();
        assert_eq!(json["mac"], "24:6F:28:00:00:01");
        assert_eq!(json["timestamp"], 42);
    }

    #[test]
    fn test_descriptor_list() {
        let descriptors = vec![
            PeripheralDescriptor::new(1, PeripheralKind::RelayActuator)
                .with_pin(26, PinRole::DigitalOutput),
        ];
        let json: Value = serde_json::from_str(&encode_descriptor_list(&descriptors).unwrap()).unwrap();
        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["tipo"], 5);
        assert_eq!(encode_descriptor_list(&[]).unwrap(), "[]");
    }

    #[rstest]
    #[case(r#"{"id": 3}"#, vec![3])]
    #[case(r#"[{"id": 1}, {"id": 2}]"#, vec![1, 2])]
    #[case(r#"[{"id": 1}, {"name": "x"}, 7, {"id": "9"}]"#, vec![1])]
    #[case("[]", vec![])]
    fn test_remove_payload(#[case] payload: &str, #[case] expected: Vec<i64>) {
        let ids = decode_remove_payload(payload.as_bytes()).unwrap();
        assert_eq!(ids, expected.into_iter().map(SensorId::new).collect::<Vec<_>>());
    }

    #[rstest]
    #[case(r#"{"name": "x"}"#)]
    #[case("42")]
    #[case("\"id\"")]
    #[case("{broken")]
    fn test_remove_payload_rejected(#[case] payload: &str) {
        assert!(decode_remove_payload(payload.as_bytes()).is_err());
    }
}
