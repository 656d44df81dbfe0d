//! Periodic liveness message on `device/<id>/heartbeat`.

use crate::transport::Transport;
use sensorlink_core::DeviceId;
use sensorlink_protocol::{Heartbeat, heartbeat_topic};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Network identity reported in heartbeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatIdentity {
    pub mac: String,
    pub ip: String,
}

impl HeartbeatIdentity {
    pub fn new(mac: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            ip: ip.into(),
        }
    }

    fn heartbeat(&self, device: &DeviceId, started: Instant) -> Heartbeat {
        Heartbeat {
            mac: self.mac.clone(),
            ip: self.ip.clone(),
            id: device.to_string(),
            timestamp: started.elapsed().as_secs(),
        }
    }
}

/// Publish a heartbeat every `interval` until `cancel` fires.
///
/// The first heartbeat goes out immediately. Failed publishes are logged and
/// skipped.
pub async fn run_heartbeat<T: Transport>(
    transport: T,
    device: DeviceId,
    identity: HeartbeatIdentity,
    interval: Duration,
    cancel: CancellationToken,
) {
    let topic = heartbeat_topic(&device);
    let started = Instant::now();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let payload = match identity.heartbeat(&device, started).to_json() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(error = %e, "heartbeat encoding failed");
                        continue;
                    }
                };
                match transport.publish(&topic, payload.into_bytes()).await {
                    Ok(()) => debug!(topic = %topic, "heartbeat sent"),
                    Err(e) => warn!(topic = %topic, error = %e, "heartbeat failed"),
                }
            }
        }
    }
}
