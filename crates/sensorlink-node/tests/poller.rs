//! Polling loop behavior against the in-memory board, store and transport.
//!
//! Run with: cargo test --package sensorlink-node --test poller

use sensorlink_core::constants::SNAPSHOT_BLOB;
use sensorlink_core::{DeviceId, PeripheralDescriptor, PeripheralKind, PinRole, SensorId};
use sensorlink_hardware::mock::MockBoard;
use sensorlink_network::RecordingTransport;
use sensorlink_node::Poller;
use sensorlink_registry::{Registry, SharedRegistry};
use sensorlink_storage::MemoryBlobStore;
use serde_json::Value;
use std::time::Duration;

const ROWS: [u8; 4] = [13, 12, 14, 27];
const COLS: [u8; 4] = [26, 25, 33, 32];

struct Fixture {
    board: MockBoard,
    store: MemoryBlobStore,
    registry: SharedRegistry,
    transport: RecordingTransport,
    poller: Poller<RecordingTransport>,
}

fn fixture() -> Fixture {
    let board = MockBoard::new();
    let store = MemoryBlobStore::new();
    let registry = Registry::new(board.shared(), store.clone()).into_shared();
    let transport = RecordingTransport::new();
    let poller = Poller::new(
        registry.clone(),
        transport.clone(),
        DeviceId::new("ESP32_005").unwrap(),
        Duration::from_secs(5),
        Duration::from_millis(100),
    );
    Fixture {
        board,
        store,
        registry,
        transport,
        poller,
    }
}

fn relay(id: i64, pin: u8) -> PeripheralDescriptor {
    PeripheralDescriptor::new(id, PeripheralKind::RelayActuator)
        .with_pin(pin, PinRole::DigitalOutput)
        .with_attributes(1, 0, 0, 0)
}

fn obstacle(id: i64, pin: u8) -> PeripheralDescriptor {
    PeripheralDescriptor::new(id, PeripheralKind::ObstacleDetector).with_pin(pin, PinRole::DigitalInput)
}

fn distance(id: i64, attr1: i32, attr2: i32) -> PeripheralDescriptor {
    PeripheralDescriptor::new(id, PeripheralKind::DistanceSensor)
        .with_pin(5, PinRole::DigitalOutput)
        .with_pin(18, PinRole::DigitalInput)
        .with_attributes(attr1, attr2, 0, 0)
}

fn keypad(id: i64) -> PeripheralDescriptor {
    ROWS.iter()
        .chain(COLS.iter())
        .fold(PeripheralDescriptor::new(id, PeripheralKind::MatrixKeypad), |d, pin| {
            d.with_pin(*pin, PinRole::DigitalInput)
        })
}

async fn add(registry: &SharedRegistry, descriptor: PeripheralDescriptor) {
    registry.lock().await.add_or_update(descriptor).await.unwrap();
}

fn payloads(transport: &RecordingTransport, topic: &str) -> Vec<Value> {
    transport
        .published_on(topic)
        .iter()
        .map(|p| serde_json::from_slice(&p.payload).unwrap())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_cycle_publishes_every_polled_peripheral() {
    let mut f = fixture();
    add(&f.registry, relay(1, 4)).await;
    add(&f.registry, obstacle(2, 34)).await;
    add(&f.registry, keypad(3)).await;
    f.board.set_input(34, true);

    let published = f.poller.telemetry_cycle().await;

    assert_eq!(published, 2);
    let topics: Vec<_> = f.transport.published().into_iter().map(|p| p.topic).collect();
    assert_eq!(topics, vec!["ESP32_005/sensors/1/data", "ESP32_005/sensors/2/data"]);

    let relay = &payloads(&f.transport, "ESP32_005/sensors/1/data")[0];
    assert_eq!(relay["device_id"], "ESP32_005");
    assert_eq!(relay["sensor_id"], 1);
    assert_eq!(relay["type"], 5);
    assert_eq!(relay["values"]["state"], 1);

    let obstacle = &payloads(&f.transport, "ESP32_005/sensors/2/data")[0];
    assert_eq!(obstacle["values"]["obstacle_detected"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_publishes_are_spaced() {
    let mut f = fixture();
    for id in 1..=3 {
        add(&f.registry, relay(id, 20 + id as u8)).await;
    }
    let started = tokio::time::Instant::now();

    f.poller.telemetry_cycle().await;

    assert_eq!(started.elapsed(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_failed_read_skips_peripheral() {
    let mut f = fixture();
    add(&f.registry, distance(1, 0, 0)).await;
    add(&f.registry, relay(2, 4)).await;

    // no echo configured: the distance read times out
    let published = f.poller.telemetry_cycle().await;

    assert_eq!(published, 1);
    assert_eq!(f.transport.published()[0].topic, "ESP32_005/sensors/2/data");
}

#[tokio::test(start_paused = true)]
async fn test_calibration_request_is_applied_once() {
    let mut f = fixture();
    add(&f.registry, distance(7, 1, 25)).await;
    f.board.set_echo_for_distance(18, 20.0);

    f.poller.telemetry_cycle().await;

    let reported = payloads(&f.transport, "ESP32_005/sensors/7/data")[0]["values"]["distance"]
        .as_f64()
        .unwrap();
    assert!((reported - 25.0).abs() < 0.1, "reported {reported}");

    let stored: Value = serde_json::from_slice(&f.store.get(SNAPSHOT_BLOB).unwrap()).unwrap();
    assert_eq!(stored[0]["atributo1"], 0);
    assert_eq!(stored[0]["atributo2"], 0);

    let registry = f.registry.lock().await;
    assert_eq!(registry.find(SensorId::new(7)).unwrap().descriptor().attr1, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cycle_retries_pending_snapshot_write() {
    let mut f = fixture();
    f.store.set_fail_writes(true);
    let result = f.registry.lock().await.add_or_update(relay(1, 4)).await;
    assert!(result.is_err());
    f.store.set_fail_writes(false);

    f.poller.telemetry_cycle().await;

    assert!(!f.registry.lock().await.is_dirty());
    assert!(f.store.get(SNAPSHOT_BLOB).is_some());
}

async fn type_keys(f: &mut Fixture, keys: &str) -> usize {
    let mut submitted = 0;
    for key in keys.chars() {
        f.board.release_all();
        submitted += f.poller.keypad_cycle().await;
        assert!(f.board.press_key(&ROWS, &COLS, key));
        submitted += f.poller.keypad_cycle().await;
    }
    f.board.release_all();
    submitted + f.poller.keypad_cycle().await
}

#[tokio::test]
async fn test_keypad_entry_is_submitted_on_hash() {
    let mut f = fixture();
    add(&f.registry, keypad(3)).await;

    assert_eq!(type_keys(&mut f, "123#").await, 1);

    let entries = payloads(&f.transport, "ESP32_005/sensors/3/data");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], 7);
    assert_eq!(entries[0]["values"]["input"], "123");
    assert!(f.poller.keypads().get(SensorId::new(3)).unwrap().is_empty());
}

#[tokio::test]
async fn test_keypad_star_clears() {
    let mut f = fixture();
    add(&f.registry, keypad(3)).await;

    assert_eq!(type_keys(&mut f, "1*2#").await, 1);
    assert_eq!(
        payloads(&f.transport, "ESP32_005/sensors/3/data")[0]["values"]["input"],
        "2"
    );
}

#[tokio::test]
async fn test_removed_keypad_loses_its_buffer() {
    let mut f = fixture();
    add(&f.registry, keypad(3)).await;
    type_keys(&mut f, "55").await;
    assert_eq!(f.poller.keypads().get(SensorId::new(3)).unwrap().input(), "55");

    f.registry.lock().await.remove(&[SensorId::new(3)]).await.unwrap();
    f.poller.keypad_cycle().await;

    assert!(f.poller.keypads().get(SensorId::new(3)).is_none());
}
