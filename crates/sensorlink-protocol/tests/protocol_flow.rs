//! End-to-end request flows through the protocol handler.
//!
//! Run with: cargo test --package sensorlink-protocol --test protocol_flow

use proptest::prelude::*;
use sensorlink_core::{DeviceId, PeripheralKind};
use sensorlink_hardware::mock::MockBoard;
use sensorlink_protocol::{Dispatch, ProtocolHandler, RemoveResponse, SetResponse};
use sensorlink_registry::Registry;
use sensorlink_storage::MemoryBlobStore;
use serde_json::{Value, json};

fn handler(board: &MockBoard, store: &MemoryBlobStore) -> ProtocolHandler {
    let registry = Registry::new(board.shared(), store.clone()).into_shared();
    ProtocolHandler::new(DeviceId::new("ESP32_005").unwrap(), registry)
}

async fn reply(handler: &ProtocolHandler, request: &str, payload: &[u8]) -> String {
    let topic = format!("ESP32_005/settings/sensors/{request}");
    match handler.handle(&topic, payload).await.unwrap() {
        Dispatch::Reply(reply) => {
            assert_eq!(reply.topic, format!("{topic}/response"));
            reply.payload
        }
        Dispatch::Restart => panic!("unexpected restart"),
    }
}

#[tokio::test]
async fn test_configure_list_remove_reload() {
    let board = MockBoard::new();
    let store = MemoryBlobStore::new();
    let handler = handler(&board, &store);

    let batch = json!({"sensors": [
        {"id": 10, "tipo": 5, "desc": "pump", "pinos": [{"pino": 26, "tipo": 2}]},
        {"id": 11, "tipo": 4, "atributo1": 90, "pinos": [{"pino": 12, "tipo": 2}]},
        {"id": 12, "tipo": 9, "pinos": [{"pino": 33, "tipo": 1}]}
    ]});
    let set = reply(&handler, "set", batch.to_string().as_bytes()).await;
    assert_eq!(set, "OK: 3 sensor(es) processado(s)");

    let list: Value = serde_json::from_str(&reply(&handler, "get", b"").await).unwrap();
    let ids: Vec<_> = list.as_array().unwrap().iter().map(|d| d["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![10, 11, 12]);
    assert_eq!(list[1]["atributo1"], 90);

    let removed = reply(&handler, "remove", br#"[{"id": 11}]"#).await;
    assert_eq!(removed, "OK: 1 sensor(es) removido(s)");
    assert!(!board.is_claimed(12));

    // a second node process on the same storage sees the same configuration
    let mut reloaded = Registry::new(MockBoard::new().shared(), store.clone());
    assert_eq!(reloaded.load_all().await.unwrap(), 2);
    let kinds: Vec<_> = reloaded.all().iter().map(|entry| entry.kind()).collect();
    assert_eq!(kinds, vec![PeripheralKind::RelayActuator, PeripheralKind::ObstacleDetector]);
}

#[tokio::test]
async fn test_update_moves_relay_to_new_pin() {
    let board = MockBoard::new();
    let store = MemoryBlobStore::new();
    let handler = handler(&board, &store);

    reply(&handler, "set", br#"{"id": 1, "tipo": 5, "pinos": [{"pino": 26, "tipo": 2}]}"#).await;
    let set = reply(
        &handler,
        "set",
        br#"{"id": 1, "tipo": 5, "atributo1": 1, "pinos": [{"pino": 25, "tipo": 2}]}"#,
    )
    .await;

    assert_eq!(set, "OK: 1 sensor(es) processado(s)");
    assert!(!board.is_claimed(26));
    assert_eq!(board.output(25), Some(true));
}

proptest! {
    /// Property: the set reply always accounts for every batch item.
    #[test]
    fn prop_set_reply_counts_items(kinds in prop::collection::vec(prop_oneof![Just(5i64), Just(8i64)], 0..8)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let response = runtime.block_on(async {
            let handler = handler(&MockBoard::new(), &MemoryBlobStore::new());
            let items: Vec<Value> = kinds
                .iter()
                .enumerate()
                .map(|(i, kind)| json!({"id": i, "tipo": kind, "pinos": [{"pino": 10 + i, "tipo": 2}]}))
                .collect();
            handler.handle_set(json!({"sensors": items}).to_string().as_bytes()).await
        });

        let good = kinds.iter().filter(|kind| **kind == 5).count();
        let bad = kinds.len() - good;
        prop_assert_eq!(response, SetResponse::from_counts(good, bad));
    }
}

#[tokio::test]
async fn test_remove_of_nothing_is_ok() {
    let store = MemoryBlobStore::new();
    let handler = handler(&MockBoard::new(), &store);
    assert_eq!(handler.handle_remove(b"[]").await, RemoveResponse::Ok { removed: 0 });
    assert_eq!(store.write_count(), 0);
}
