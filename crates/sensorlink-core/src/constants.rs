//! Core constants shared by every sensorlink crate.
//!
//! This module centralizes the wire-level names (topics, blob names, response
//! prefixes) and the timing parameters of the node. Keeping them here ensures
//! the protocol handler, the transport and the polling loop agree on the same
//! values.
//!
//! # Topic Layout
//!
//! All topics are rooted at the node's device id:
//!
//! ```text
//! <device>/settings/sensors/set        -> <device>/settings/sensors/set/response
//! <device>/settings/sensors/get        -> <device>/settings/sensors/get/response
//! <device>/settings/sensors/remove     -> <device>/settings/sensors/remove/response
//! <device>/settings/device/reset
//! <device>/sensors/<sensor_id>/data    (telemetry)
//! device/<device>/heartbeat            (liveness)
//! ```
//!
//! # Usage
//!
//! ```
//! use sensorlink_core::constants::*;
//!
//! assert_eq!(SNAPSHOT_BLOB, "devices.json");
//! assert_eq!(KEYPAD_BUFFER_CAPACITY, 64);
//! ```

// ============================================================================
// Topics
// ============================================================================

/// Suffix of the add/update request topic.
pub const TOPIC_SENSORS_SET: &str = "settings/sensors/set";

/// Suffix of the listing request topic.
pub const TOPIC_SENSORS_GET: &str = "settings/sensors/get";

/// Suffix of the removal request topic.
pub const TOPIC_SENSORS_REMOVE: &str = "settings/sensors/remove";

/// Suffix of the factory reset topic.
pub const TOPIC_DEVICE_RESET: &str = "settings/device/reset";

/// Appended to a request topic to form its response topic.
pub const TOPIC_RESPONSE_SUFFIX: &str = "response";

/// Segment between the device id and the sensor id in telemetry topics.
pub const TOPIC_TELEMETRY_SEGMENT: &str = "sensors";

/// Last segment of telemetry topics.
pub const TOPIC_TELEMETRY_SUFFIX: &str = "data";

/// Prefix of the heartbeat topic (`device/<id>/heartbeat`).
pub const TOPIC_HEARTBEAT_PREFIX: &str = "device";

/// Last segment of the heartbeat topic.
pub const TOPIC_HEARTBEAT_SUFFIX: &str = "heartbeat";

/// Characters that may not appear in a device id because they are MQTT
/// topic separators or wildcards.
pub const RESERVED_TOPIC_CHARS: [char; 3] = ['/', '+', '#'];

// ============================================================================
// Payload keys
// ============================================================================

/// Key holding the descriptor array of a batch set request.
pub const BATCH_KEY: &str = "sensors";

// ============================================================================
// Durable blobs
// ============================================================================

/// Blob holding the descriptor snapshot.
pub const SNAPSHOT_BLOB: &str = "devices.json";

/// Blob holding persisted broker settings.
pub const BROKER_SETTINGS_BLOB: &str = "mqtt.json";

/// Blob holding the extra subscription list.
pub const TOPICS_BLOB: &str = "topics.json";

/// Every blob erased by a factory reset.
pub const CONFIGURATION_BLOBS: [&str; 3] = [SNAPSHOT_BLOB, BROKER_SETTINGS_BLOB, TOPICS_BLOB];

// ============================================================================
// Timing (milliseconds)
// ============================================================================

/// Interval between bulk telemetry cycles.
pub const DEFAULT_TELEMETRY_INTERVAL_MS: u64 = 5_000;

/// Interval between keypad scans.
pub const DEFAULT_KEYPAD_TICK_MS: u64 = 100;

/// Pause between consecutive telemetry publishes inside one cycle.
pub const PUBLISH_GAP_MS: u64 = 50;

/// Interval between heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 10_000;

/// Delay between broker reconnect attempts.
pub const RECONNECT_DELAY_MS: u64 = 2_000;

/// Reconnect attempts allowed at startup before giving up.
pub const STARTUP_RECONNECT_ATTEMPTS: u32 = 5;

/// Attempts made when publishing a response.
pub const RESPONSE_PUBLISH_ATTEMPTS: u32 = 3;

/// Delay between response publish attempts.
pub const RESPONSE_RETRY_DELAY_MS: u64 = 100;

/// Upper bound of an ultrasonic echo wait.
pub const ECHO_TIMEOUT_MS: u64 = 30;

// ============================================================================
// Broker defaults
// ============================================================================

/// Device id used when none is configured.
pub const DEFAULT_DEVICE_ID: &str = "ESP32_005";

/// Broker host used when none is configured.
pub const DEFAULT_BROKER_HOST: &str = "127.0.0.1";

/// Standard MQTT port.
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// MQTT keepalive in seconds.
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 30;

// ============================================================================
// Peripherals
// ============================================================================

/// Maximum characters held by a keypad buffer; further keys are dropped.
pub const KEYPAD_BUFFER_CAPACITY: usize = 64;

/// Key that clears a keypad buffer.
pub const KEYPAD_CLEAR_KEY: char = '*';

/// Key that flushes a keypad buffer.
pub const KEYPAD_SUBMIT_KEY: char = '#';

/// Row-major layout of the 4x4 matrix keypad.
pub const KEYPAD_LAYOUT: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Maximum servo angle in degrees.
pub const SERVO_MAX_ANGLE: u8 = 180;

/// Speed of sound in centimeters per microsecond.
pub const SOUND_SPEED_CM_PER_US: f32 = 0.034;

/// Below this magnitude the least squares denominator is treated as zero.
pub const CALIBRATION_DEGENERATE_EPSILON: f64 = 1e-9;

/// Accelerometer I2C address with the select pin low or absent.
pub const ACCELEROMETER_ADDRESS: u8 = 0x68;

/// Accelerometer I2C address with the select pin driven high.
pub const ACCELEROMETER_ALT_ADDRESS: u8 = 0x69;

/// Color/gesture sensor I2C address.
pub const COLOR_SENSOR_ADDRESS: u8 = 0x39;

/// Full scale of the 12-bit ADC.
pub const ADC_FULL_SCALE: u16 = 4095;
