#![allow(async_fn_in_trait)]

use crate::error::{TransportError, TransportResult};
use crate::mqtt::MqttTransport;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Bytes,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Outbound side of a broker session.
///
/// # Implementation Note
///
/// Native async trait methods (Edition 2024); runtime selection goes through
/// [`AnyTransport`].
pub trait Transport: Send + Sync {
    /// Publish `payload` on `topic`.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> TransportResult<()>;

    /// Subscribe to `topic`.
    async fn subscribe(&self, topic: &str) -> TransportResult<()>;
}

/// One message handed to a [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Published {
    /// Payload as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

#[derive(Debug, Default)]
struct Recorded {
    published: Vec<Published>,
    subscriptions: Vec<String>,
}

/// In-memory transport that records traffic.
///
/// Cloning yields another view of the same record. Publishes can be made to
/// fail a number of times to exercise retry paths.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    recorded: Arc<Mutex<Recorded>>,
    failures: Arc<AtomicUsize>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `count` publishes fail.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Every successful publish so far, in order.
    pub fn published(&self) -> Vec<Published> {
        self.lock().published.clone()
    }

    /// Successful publishes on `topic`.
    pub fn published_on(&self, topic: &str) -> Vec<Published> {
        self.lock()
            .published
            .iter()
            .filter(|p| p.topic == topic)
            .cloned()
            .collect()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.lock().subscriptions.clone()
    }

    pub fn clear(&self) {
        self.lock().published.clear();
    }
}

impl Transport for RecordingTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> TransportResult<()> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransportError::publish(topic, "injected failure"));
        }

        trace!(topic, bytes = payload.len(), "recorded publish");
        self.lock().published.push(Published {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> TransportResult<()> {
        self.lock().subscriptions.push(topic.to_string());
        Ok(())
    }
}

/// Enum wrapper for transport dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyTransport {
    /// Live broker session.
    Mqtt(MqttTransport),
    /// In-memory record.
    Recording(RecordingTransport),
}

impl From<MqttTransport> for AnyTransport {
    fn from(transport: MqttTransport) -> Self {
        Self::Mqtt(transport)
    }
}

impl From<RecordingTransport> for AnyTransport {
    fn from(transport: RecordingTransport) -> Self {
        Self::Recording(transport)
    }
}

impl Transport for AnyTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> TransportResult<()> {
        match self {
            Self::Mqtt(transport) => transport.publish(topic, payload).await,
            Self::Recording(transport) => transport.publish(topic, payload).await,
        }
    }

    async fn subscribe(&self, topic: &str) -> TransportResult<()> {
        match self {
            Self::Mqtt(transport) => transport.subscribe(topic).await,
            Self::Recording(transport) => transport.subscribe(topic).await,
        }
    }
}
