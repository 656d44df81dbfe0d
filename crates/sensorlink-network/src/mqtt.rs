//! MQTT session over rumqttc.
//!
//! ```text
//!   MqttSession::connect ── waits for ConnAck (bounded attempts) ──┐
//!                                                                 ▼
//!   ┌─────────────────────── event task ───────────────────────────────┐
//!   │ loop select!                                                     │
//!   │   cancelled         → stop                                       │
//!   │   Publish           → inbound channel                            │
//!   │   ConnAck           → re-subscribe every topic                   │
//!   │   error             → wait, poll again (unbounded)               │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Startup gives up after [`ReconnectPolicy::startup_attempts`] failed
//! connection attempts. Once connected, the event task reconnects forever.
//!
//! Publishing never waits for the broker: while the session is down the
//! client request queue fills up, and a publish that finds it full fails
//! with [`TransportError::Publish`] instead of blocking the caller.

use crate::error::{TransportError, TransportResult};
use crate::transport::{InboundMessage, Transport};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use sensorlink_core::constants::{
    DEFAULT_KEEP_ALIVE_SECS, RECONNECT_DELAY_MS, STARTUP_RECONNECT_ATTEMPTS,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Capacity of the client request channel and of the inbound channel.
const CHANNEL_CAPACITY: usize = 32;

/// Broker endpoint and client identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive: Duration,
}

impl MqttSettings {
    pub fn new(host: impl Into<String>, port: u16, client_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: client_id.into(),
            keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        options
    }
}

/// How connection failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Failed attempts tolerated before the first ConnAck.
    pub startup_attempts: u32,
    /// Pause after each failed attempt.
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            startup_attempts: STARTUP_RECONNECT_ATTEMPTS,
            delay: Duration::from_millis(RECONNECT_DELAY_MS),
        }
    }
}

/// Publishing handle of a live session.
#[derive(Debug, Clone)]
pub struct MqttTransport {
    client: AsyncClient,
}

impl MqttTransport {
    /// Ask the broker to end the session.
    pub fn disconnect(&self) -> TransportResult<()> {
        self.client.try_disconnect()?;
        Ok(())
    }
}

impl Transport for MqttTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> TransportResult<()> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|e| TransportError::publish(topic, e.to_string()))
    }

    async fn subscribe(&self, topic: &str) -> TransportResult<()> {
        self.client.subscribe(topic, QoS::AtMostOnce).await?;
        Ok(())
    }
}

/// Connected session: publishing handle, inbound messages and the task
/// driving the network.
#[derive(Debug)]
pub struct MqttSession {
    pub transport: MqttTransport,
    pub inbound: mpsc::Receiver<InboundMessage>,
    pub task: JoinHandle<()>,
}

impl MqttSession {
    /// Connect, subscribe to `topics` and start the event task.
    ///
    /// # Errors
    /// - `TransportError::ConnectFailed`: no ConnAck within the startup attempts
    /// - `TransportError::Closed`: `cancel` fired while connecting
    pub async fn connect(
        settings: &MqttSettings,
        topics: Vec<String>,
        policy: ReconnectPolicy,
        cancel: CancellationToken,
    ) -> TransportResult<Self> {
        info!(host = %settings.host, port = settings.port, client = %settings.client_id, "connecting to broker");
        let (client, mut eventloop) = AsyncClient::new(settings.options(), CHANNEL_CAPACITY);

        wait_for_connack(&mut eventloop, policy, &cancel).await?;

        let topics: Arc<[String]> = topics.into();
        let (sender, inbound) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(run_event_loop(
            client.clone(),
            eventloop,
            Arc::clone(&topics),
            sender,
            policy.delay,
            cancel,
        ));

        let transport = MqttTransport { client };
        for topic in topics.iter() {
            transport.subscribe(topic).await?;
            debug!(topic = %topic, "subscribed");
        }
        info!(topics = topics.len(), "broker session ready");

        Ok(Self {
            transport,
            inbound,
            task,
        })
    }
}

async fn wait_for_connack(
    eventloop: &mut EventLoop,
    policy: ReconnectPolicy,
    cancel: &CancellationToken,
) -> TransportResult<()> {
    let mut failures = 0;
    loop {
        tokio::select! {
            () = cancel.cancelled() => return Err(TransportError::Closed),
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!(code = ?ack.code, "connected to broker");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    failures += 1;
                    warn!(attempt = failures, max = policy.startup_attempts, error = %e, "broker connection failed");
                    if failures >= policy.startup_attempts {
                        return Err(TransportError::ConnectFailed { attempts: failures });
                    }
                    tokio::select! {
                        () = cancel.cancelled() => return Err(TransportError::Closed),
                        () = tokio::time::sleep(policy.delay) => {}
                    }
                }
            }
        }
    }
}

async fn run_event_loop(
    client: AsyncClient,
    mut eventloop: EventLoop,
    topics: Arc<[String]>,
    sender: mpsc::Sender<InboundMessage>,
    delay: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::Publish(packet))) => {
                    let topic = String::from_utf8_lossy(AsRef::<[u8]>::as_ref(&packet.topic)).into_owned();
                    if sender.send(InboundMessage::new(topic, packet.payload)).await.is_err() {
                        debug!("inbound receiver dropped, stopping event task");
                        break;
                    }
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("reconnected to broker");
                    // the request channel is drained by this task, so never block on it here
                    for topic in topics.iter() {
                        if let Err(e) = client.try_subscribe(topic.as_str(), QoS::AtMostOnce) {
                            error!(topic = %topic, error = %e, "re-subscribe failed");
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Disconnect)) => warn!("broker closed the session"),
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "broker connection lost, retrying");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
    debug!("event task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.startup_attempts, 5);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }

    #[test]
    fn test_settings_options() {
        let settings = MqttSettings::new("broker.local", 1884, "ESP32_005")
            .with_keep_alive(Duration::from_secs(15));
        let options = settings.options();

        assert_eq!(options.broker_address(), ("broker.local".to_string(), 1884));
        assert_eq!(options.keep_alive(), Duration::from_secs(15));
        assert_eq!(options.client_id(), "ESP32_005");
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_gives_up_on_unreachable_broker() {
        // nothing listens on port 1 of the loopback interface
        let settings = MqttSettings::new("127.0.0.1", 1, "test-node");
        let policy = ReconnectPolicy {
            startup_attempts: 2,
            delay: Duration::from_millis(10),
        };

        let result =
            MqttSession::connect(&settings, Vec::new(), policy, CancellationToken::new()).await;

        assert!(matches!(result, Err(TransportError::ConnectFailed { attempts: 2 })));
    }

    #[tokio::test]
    async fn test_cancel_stops_connecting() {
        let settings = MqttSettings::new("127.0.0.1", 1, "test-node");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = MqttSession::connect(&settings, Vec::new(), ReconnectPolicy::default(), cancel).await;
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_publish_does_not_block_while_broker_down() {
        let settings = MqttSettings::new("127.0.0.1", 1, "test-node");
        let (client, eventloop) = AsyncClient::new(settings.options(), CHANNEL_CAPACITY);
        let (sender, _inbound) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_event_loop(
            client.clone(),
            eventloop,
            Arc::from(Vec::<String>::new()),
            sender,
            Duration::from_millis(10),
            cancel.clone(),
        ));
        let transport = MqttTransport { client };

        let mut rejected = 0;
        for n in 0..(CHANNEL_CAPACITY * 3) {
            let outcome = tokio::time::timeout(
                Duration::from_secs(1),
                transport.publish("ESP32_001/telemetry", vec![n as u8]),
            )
            .await
            .unwrap_or_else(|_| panic!("publish #{n} waited for the broker"));
            if let Err(e) = outcome {
                assert!(matches!(e, TransportError::Publish { .. }));
                rejected += 1;
            }
        }
        assert!(rejected > 0);

        cancel.cancel();
        task.await.unwrap();
    }
}
