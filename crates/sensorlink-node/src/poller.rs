//! Polling and publishing of peripheral readings.
//!
//! ```text
//!  every telemetry interval            every keypad tick
//!  ───────────────────────             ─────────────────
//!  retry pending snapshot write        scan each keypad
//!  for each polled peripheral:         feed key to its buffer
//!    consume calibration request       publish submitted input
//!    read
//!    publish (50 ms apart)
//! ```
//!
//! The registry lock is taken per peripheral, never for a whole cycle.

use crate::keypad::KeypadBuffers;
use sensorlink_core::constants::PUBLISH_GAP_MS;
use sensorlink_core::{DeviceId, PeripheralKind, SensorId};
use sensorlink_hardware::Reading;
use sensorlink_network::Transport;
use sensorlink_protocol::{Telemetry, telemetry_topic};
use sensorlink_registry::SharedRegistry;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reading key of a submitted keypad entry.
pub const KEYPAD_INPUT_KEY: &str = "input";

/// Periodic reader of the registry.
#[derive(Debug)]
pub struct Poller<T> {
    registry: SharedRegistry,
    transport: T,
    device: DeviceId,
    telemetry_interval: Duration,
    keypad_tick: Duration,
    publish_gap: Duration,
    keypads: KeypadBuffers,
}

impl<T: Transport> Poller<T> {
    pub fn new(
        registry: SharedRegistry,
        transport: T,
        device: DeviceId,
        telemetry_interval: Duration,
        keypad_tick: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            device,
            telemetry_interval,
            keypad_tick,
            publish_gap: Duration::from_millis(PUBLISH_GAP_MS),
            keypads: KeypadBuffers::new(),
        }
    }

    /// Run both schedules until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut telemetry = tokio::time::interval(self.telemetry_interval);
        telemetry.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut keypad = tokio::time::interval(self.keypad_tick);
        keypad.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            telemetry_ms = self.telemetry_interval.as_millis() as u64,
            keypad_ms = self.keypad_tick.as_millis() as u64,
            "poller started"
        );
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = telemetry.tick() => {
                    self.telemetry_cycle().await;
                }
                _ = keypad.tick() => {
                    self.keypad_cycle().await;
                }
            }
        }
        debug!("poller stopped");
    }

    /// One bulk pass over every polled peripheral. Returns the number of
    /// telemetry messages published.
    pub async fn telemetry_cycle(&mut self) -> usize {
        let ids = {
            let mut registry = self.registry.lock().await;
            if let Err(e) = registry.persist_if_dirty().await {
                warn!(error = %e, "snapshot still behind memory");
            }
            registry.polled_ids()
        };

        let mut published = 0;
        for id in ids {
            self.consume_calibration(id).await;

            let Some((kind, reading)) = self.read(id).await else {
                continue;
            };
            if published > 0 {
                tokio::time::sleep(self.publish_gap).await;
            }
            if self.publish(id, kind, &reading).await {
                published += 1;
            }
        }
        debug!(published, "telemetry cycle done");
        published
    }

    /// Scan every keypad once. Returns the number of submitted entries.
    pub async fn keypad_cycle(&mut self) -> usize {
        let ids = self.registry.lock().await.keypad_ids();
        self.keypads.retain(&ids);

        let mut submitted = 0;
        for id in ids {
            let key = self.registry.lock().await.scan_keypad(id).await;
            let key = match key {
                Ok(Some(key)) => key,
                Ok(None) => continue,
                Err(e) => {
                    warn!(%id, error = %e, "keypad scan failed");
                    continue;
                }
            };

            debug!(%id, %key, "key pressed");
            if let Some(input) = self.keypads.press(id, key) {
                let reading = Reading::new().with(KEYPAD_INPUT_KEY, input);
                if self.publish(id, PeripheralKind::MatrixKeypad, &reading).await {
                    submitted += 1;
                }
            }
        }
        submitted
    }

    pub fn keypads(&self) -> &KeypadBuffers {
        &self.keypads
    }

    async fn consume_calibration(&self, id: SensorId) {
        let mut registry = self.registry.lock().await;
        let command = match registry.take_calibration(id).await {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(e) => {
                warn!(%id, error = %e, "calibration request discarded");
                return;
            }
        };

        match registry.calibrate(id, command).await {
            Ok(raw) => info!(%id, ?command, ?raw, "calibration applied"),
            Err(e) => warn!(%id, ?command, error = %e, "calibration failed"),
        }
    }

    async fn read(&self, id: SensorId) -> Option<(PeripheralKind, Reading)> {
        let mut registry = self.registry.lock().await;
        let kind = registry.find(id)?.kind();
        match registry.read(id).await {
            Ok(reading) => Some((kind, reading)),
            Err(e) => {
                warn!(%id, %kind, error = %e, "read failed, skipping this cycle");
                None
            }
        }
    }

    async fn publish(&self, id: SensorId, kind: PeripheralKind, reading: &Reading) -> bool {
        let topic = telemetry_topic(&self.device, id);
        let payload = match Telemetry::new(&self.device, id, kind, reading).to_json() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%id, error = %e, "telemetry encoding failed");
                return false;
            }
        };

        match self.transport.publish(&topic, payload.into_bytes()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%topic, error = %e, "telemetry publish failed");
                false
            }
        }
    }
}
