//! Inbound request loop of the connection task.

use crate::publisher::{RetryPolicy, publish_with_retry};
use crate::transport::{InboundMessage, Transport};
use sensorlink_protocol::{Dispatch, ProtocolError, ProtocolHandler};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Why the inbound loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchExit {
    /// Shutdown was requested.
    Cancelled,
    /// The session's inbound channel closed.
    Disconnected,
    /// A factory reset was handled; the process must restart.
    Restart,
}

/// Answer inbound requests until cancelled, disconnected or reset.
///
/// Replies are published with `retry`. Messages on topics that are not
/// request topics of the device are logged and dropped.
pub async fn run_dispatch<T: Transport>(
    handler: &ProtocolHandler,
    transport: &T,
    inbound: &mut mpsc::Receiver<InboundMessage>,
    retry: RetryPolicy,
    cancel: &CancellationToken,
) -> DispatchExit {
    loop {
        let message = tokio::select! {
            () = cancel.cancelled() => return DispatchExit::Cancelled,
            message = inbound.recv() => match message {
                Some(message) => message,
                None => return DispatchExit::Disconnected,
            },
        };

        match handler.handle(&message.topic, &message.payload).await {
            Ok(Dispatch::Reply(reply)) => {
                if let Err(e) =
                    publish_with_retry(transport, &reply.topic, reply.payload.as_bytes(), retry).await
                {
                    error!(topic = %reply.topic, error = %e, "reply lost");
                }
            }
            Ok(Dispatch::Restart) => {
                info!("restart requested by factory reset");
                return DispatchExit::Restart;
            }
            Err(ProtocolError::UnknownTopic(topic)) => debug!(%topic, "ignoring message"),
            Err(ProtocolError::Reset(e)) => {
                warn!(error = %e, "factory reset incomplete, restarting anyway");
                return DispatchExit::Restart;
            }
            Err(e) => warn!(topic = %message.topic, error = %e, "request failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingTransport;
    use sensorlink_core::DeviceId;
    use sensorlink_core::constants::SNAPSHOT_BLOB;
    use sensorlink_hardware::mock::MockBoard;
    use sensorlink_registry::Registry;
    use sensorlink_storage::MemoryBlobStore;

    fn handler(store: &MemoryBlobStore) -> ProtocolHandler {
        let registry = Registry::new(MockBoard::new().shared(), store.clone()).into_shared();
        ProtocolHandler::new(DeviceId::new("ESP32_005").unwrap(), registry)
    }

    #[tokio::test]
    async fn test_requests_are_answered_in_order() {
        let store = MemoryBlobStore::new();
        let handler = handler(&store);
        let transport = RecordingTransport::new();
        let (sender, mut inbound) = mpsc::channel(8);

        sender
            .send(InboundMessage::new(
                "ESP32_005/settings/sensors/set",
                r#"{"id": 1, "tipo": 5, "pinos": [{"pino": 26, "tipo": 2}]}"#,
            ))
            .await
            .unwrap();
        sender.send(InboundMessage::new("ESP32_005/custom", "x")).await.unwrap();
        sender
            .send(InboundMessage::new("ESP32_005/settings/sensors/get", ""))
            .await
            .unwrap();
        drop(sender);

        let exit = run_dispatch(
            &handler,
            &transport,
            &mut inbound,
            RetryPolicy::default(),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(exit, DispatchExit::Disconnected);
        let published = transport.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].topic, "ESP32_005/settings/sensors/set/response");
        assert_eq!(published[0].text(), "OK: 1 sensor(es) processado(s)");
        assert_eq!(published[1].topic, "ESP32_005/settings/sensors/get/response");
    }

    #[tokio::test]
    async fn test_reset_ends_the_loop() {
        let store = MemoryBlobStore::new();
        store.insert(SNAPSHOT_BLOB, "[]");
        let handler = handler(&store);
        let transport = RecordingTransport::new();
        let (sender, mut inbound) = mpsc::channel(8);
        sender
            .send(InboundMessage::new("ESP32_005/settings/device/reset", ""))
            .await
            .unwrap();

        let exit = run_dispatch(
            &handler,
            &transport,
            &mut inbound,
            RetryPolicy::default(),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(exit, DispatchExit::Restart);
        assert!(store.get(SNAPSHOT_BLOB).is_none());
        assert!(transport.published().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled() {
        let handler = handler(&MemoryBlobStore::new());
        let (_sender, mut inbound) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let exit = run_dispatch(
            &handler,
            &RecordingTransport::new(),
            &mut inbound,
            RetryPolicy::default(),
            &cancel,
        )
        .await;
        assert_eq!(exit, DispatchExit::Cancelled);
    }
}
