//! Topic layout of a node.
//!
//! ```text
//! <device>/settings/sensors/{set,get,remove}            requests
//! <device>/settings/sensors/{set,get,remove}/response   replies
//! <device>/settings/device/reset                        factory reset
//! <device>/sensors/<sensor_id>/data                     telemetry
//! device/<device>/heartbeat                             liveness
//! ```

use sensorlink_core::constants::{
    TOPIC_DEVICE_RESET, TOPIC_HEARTBEAT_PREFIX, TOPIC_HEARTBEAT_SUFFIX, TOPIC_RESPONSE_SUFFIX,
    TOPIC_SENSORS_GET, TOPIC_SENSORS_REMOVE, TOPIC_SENSORS_SET, TOPIC_TELEMETRY_SEGMENT,
    TOPIC_TELEMETRY_SUFFIX,
};
use sensorlink_core::{DeviceId, SensorId};
use std::fmt;

/// Inbound request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    Set,
    Get,
    Remove,
    Reset,
}

impl Request {
    pub const ALL: [Request; 4] = [Self::Set, Self::Get, Self::Remove, Self::Reset];

    fn suffix(self) -> &'static str {
        match self {
            Self::Set => TOPIC_SENSORS_SET,
            Self::Get => TOPIC_SENSORS_GET,
            Self::Remove => TOPIC_SENSORS_REMOVE,
            Self::Reset => TOPIC_DEVICE_RESET,
        }
    }

    /// Request topic of `device`.
    pub fn topic(self, device: &DeviceId) -> String {
        format!("{device}/{}", self.suffix())
    }

    /// Reply topic; reset has none.
    pub fn response_topic(self, device: &DeviceId) -> Option<String> {
        match self {
            Self::Reset => None,
            _ => Some(format!("{}/{TOPIC_RESPONSE_SUFFIX}", self.topic(device))),
        }
    }

    /// Match an inbound topic exactly against the request topics of `device`.
    pub fn route(device: &DeviceId, topic: &str) -> Option<Self> {
        let rest = topic.strip_prefix(device.as_str())?.strip_prefix('/')?;
        Self::ALL.into_iter().find(|request| request.suffix() == rest)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Set => "set",
            Self::Get => "get",
            Self::Remove => "remove",
            Self::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// `<device>/sensors/<sensor_id>/data`
pub fn telemetry_topic(device: &DeviceId, sensor: SensorId) -> String {
    format!("{device}/{TOPIC_TELEMETRY_SEGMENT}/{sensor}/{TOPIC_TELEMETRY_SUFFIX}")
}

/// `device/<device>/heartbeat`
pub fn heartbeat_topic(device: &DeviceId) -> String {
    format!("{TOPIC_HEARTBEAT_PREFIX}/{device}/{TOPIC_HEARTBEAT_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn device() -> DeviceId {
        DeviceId::new("ESP32_005").unwrap()
    }

    #[rstest]
    #[case("ESP32_005/settings/sensors/set", Some(Request::Set))]
    #[case("ESP32_005/settings/sensors/get", Some(Request::Get))]
    #[case("ESP32_005/settings/sensors/remove", Some(Request::Remove))]
    #[case("ESP32_005/settings/device/reset", Some(Request::Reset))]
    #[case("ESP32_006/settings/sensors/set", None)]
    #[case("ESP32_005/settings/sensors/set/response", None)]
    #[case("ESP32_005settings/sensors/set", None)]
    #[case("custom/topic", None)]
    fn test_route(#[case] topic: &str, #[case] expected: Option<Request>) {
        assert_eq!(Request::route(&device(), topic), expected);
    }

    #[test]
    fn test_topics() {
        let device = device();
        assert_eq!(
            Request::Set.response_topic(&device).unwrap(),
            "ESP32_005/settings/sensors/set/response"
        );
        assert_eq!(Request::Reset.response_topic(&device), None);
        assert_eq!(
            telemetry_topic(&device, SensorId::new(12)),
            "ESP32_005/sensors/12/data"
        );
        assert_eq!(heartbeat_topic(&device), "device/ESP32_005/heartbeat");
    }

    #[test]
    fn test_every_request_routes_back() {
        let device = device();
        for request in Request::ALL {
            assert_eq!(Request::route(&device, &request.topic(&device)), Some(request));
        }
    }
}
