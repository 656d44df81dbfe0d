//! The peripheral registry.
//!
//! The registry owns every live driver together with the descriptor it was
//! built from, and mirrors the descriptors to the durable snapshot after each
//! mutation.
//!
//! ```text
//!            add_or_update / remove / take_calibration
//!                          │
//!                          ▼
//!   ┌──────────────────────────────────────────┐      persist      ┌──────────────┐
//!   │ Registry                                 │ ────────────────► │ devices.json │
//!   │  [Entry(descriptor, AnyDriver)] ordered  │ ◄──────────────── │ (BlobStore)  │
//!   └──────────────────────────────────────────┘      load_all     └──────────────┘
//!                          │
//!                          ▼
//!                 Board (pins claimed by drivers)
//! ```
//!
//! # Persistence
//!
//! Memory is ahead of disk until the next successful persist. A failed write
//! keeps the mutation, reports `RegistryError::Persistence` and marks the
//! registry dirty; the next mutation or [`Registry::persist_if_dirty`] call
//! writes the snapshot again.
//!
//! # Driver lifetime
//!
//! A replaced driver is dropped before its successor is constructed, so the
//! successor can claim the same pins.

use crate::error::{RegistryError, RegistryResult};
use sensorlink_core::{
    ActuatorCommand, CalibrationCommand, PeripheralDescriptor, PeripheralKind, SensorId,
};
use sensorlink_hardware::{
    AnyDriver, BoardRef, Calibratable, HardwareError, KeyScanner, PeripheralDevice, Reading,
};
use sensorlink_storage::{AnyBlobStore, snapshot};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Registry shared between the connection task and the polling task.
pub type SharedRegistry = Arc<Mutex<Registry>>;

/// What `add_or_update` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new entry was appended.
    Added,
    /// An existing entry was changed in place or rebuilt at its position.
    Updated,
}

/// One configured peripheral.
#[derive(Debug)]
pub struct Entry {
    descriptor: PeripheralDescriptor,
    driver: AnyDriver,
}

impl Entry {
    pub fn id(&self) -> SensorId {
        self.descriptor.id
    }

    pub fn kind(&self) -> PeripheralKind {
        self.descriptor.kind
    }

    pub fn descriptor(&self) -> &PeripheralDescriptor {
        &self.descriptor
    }

    pub fn driver(&self) -> &AnyDriver {
        &self.driver
    }
}

/// Ordered collection of live peripherals backed by the snapshot blob.
#[derive(Debug)]
pub struct Registry {
    entries: Vec<Entry>,
    board: BoardRef,
    store: AnyBlobStore,
    dirty: bool,
}

impl Registry {
    /// Empty registry. Call [`load_all`](Self::load_all) to restore the snapshot.
    pub fn new(board: BoardRef, store: impl Into<AnyBlobStore>) -> Self {
        Self {
            entries: Vec::new(),
            board,
            store: store.into(),
            dirty: false,
        }
    }

    /// Wrap into the shared handle used by the node's tasks.
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Rebuild the collection from the snapshot.
    ///
    /// Every current driver is dropped first. Entries that fail to decode,
    /// repeat an id, or whose driver cannot be built are skipped and logged.
    /// The snapshot itself is not rewritten.
    ///
    /// # Errors
    /// Returns `RegistryError::Snapshot` when the snapshot cannot be read or
    /// is not a JSON array; the collection is then left empty.
    pub async fn load_all(&mut self) -> RegistryResult<usize> {
        self.entries.clear();
        self.dirty = false;

        let items = match snapshot::load_snapshot(&self.store).await {
            Ok(Some(items)) => items,
            Ok(None) => {
                info!("no snapshot found, starting with no peripherals");
                return Ok(0);
            }
            Err(e) => {
                warn!(error = %e, "snapshot unreadable, starting with no peripherals");
                return Err(RegistryError::Snapshot(e));
            }
        };

        for (index, item) in items.iter().enumerate() {
            let descriptor = match PeripheralDescriptor::from_value(item) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    warn!(index, error = %e, "skipping undecodable snapshot entry");
                    continue;
                }
            };

            if self.position(descriptor.id).is_some() {
                warn!(id = %descriptor.id, "skipping duplicate snapshot entry");
                continue;
            }

            match AnyDriver::create(&descriptor, &self.board) {
                Ok(driver) => self.entries.push(Entry { descriptor, driver }),
                Err(e) => warn!(
                    id = %descriptor.id,
                    kind = %descriptor.kind,
                    error = %e,
                    "skipping peripheral, driver construction failed"
                ),
            }
        }

        info!(loaded = self.entries.len(), stored = items.len(), "snapshot loaded");
        Ok(self.entries.len())
    }

    /// Insert a new peripheral or reconfigure an existing one.
    ///
    /// - unknown id: build the driver and append
    /// - same kind with in-place updates (relay, servo, distance) and unchanged
    ///   pins: keep the driver, push the actuator set-point, store the new
    ///   description and attributes
    /// - anything else: drop the old driver and build a new one at the same
    ///   position
    ///
    /// # Errors
    /// - `RegistryError::Validation`: wrong pin count; nothing changed
    /// - `RegistryError::Driver`: construction failed or the set-point was
    ///   refused. For a rebuild the old entry is already gone.
    /// - `RegistryError::Persistence`: the change is kept in memory only
    pub async fn add_or_update(
        &mut self,
        descriptor: PeripheralDescriptor,
    ) -> RegistryResult<Outcome> {
        descriptor.validate()?;
        let id = descriptor.id;

        let Some(index) = self.position(id) else {
            let driver = AnyDriver::create(&descriptor, &self.board)
                .map_err(|e| RegistryError::driver(id, e))?;
            info!(%id, kind = %descriptor.kind, "peripheral added");
            self.entries.push(Entry { descriptor, driver });
            self.persist().await?;
            return Ok(Outcome::Added);
        };

        let entry = &mut self.entries[index];
        if entry.descriptor.kind == descriptor.kind
            && descriptor.kind.updates_in_place()
            && entry.descriptor.same_wiring(&descriptor)
        {
            if let Some(command) = ActuatorCommand::from_descriptor(&descriptor) {
                entry
                    .driver
                    .apply(command)
                    .await
                    .map_err(|e| RegistryError::driver(id, e))?;
            }
            debug!(%id, instance = %entry.driver.instance_id(), "peripheral updated in place");
            entry.descriptor = descriptor;
            self.persist().await?;
            return Ok(Outcome::Updated);
        }

        let previous = self.entries.remove(index);
        let previous_kind = previous.descriptor.kind;
        drop(previous);

        match AnyDriver::create(&descriptor, &self.board) {
            Ok(driver) => {
                info!(%id, from = %previous_kind, to = %descriptor.kind, "peripheral rebuilt");
                self.entries.insert(index, Entry { descriptor, driver });
                self.persist().await?;
                Ok(Outcome::Updated)
            }
            Err(e) => {
                warn!(%id, error = %e, "replacement driver failed, peripheral dropped");
                // a failed write leaves the registry dirty for the next attempt
                let _ = self.persist().await;
                Err(RegistryError::driver(id, e))
            }
        }
    }

    /// Drop the given peripherals. Unknown ids are ignored.
    ///
    /// The snapshot is written once, and only if something was removed (or
    /// an earlier write is still pending).
    ///
    /// # Errors
    /// Returns `RegistryError::Persistence` if that write fails; the entries
    /// are gone from memory regardless.
    pub async fn remove(&mut self, ids: &[SensorId]) -> RegistryResult<usize> {
        let before = self.entries.len();
        self.entries.retain(|entry| !ids.contains(&entry.descriptor.id));
        let removed = before - self.entries.len();

        if removed > 0 {
            info!(removed, "peripherals removed");
        }
        if removed > 0 || self.dirty {
            self.persist().await?;
        }
        Ok(removed)
    }

    pub fn find(&self, id: SensorId) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.descriptor.id == id)
    }

    pub fn find_mut(&mut self, id: SensorId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| entry.descriptor.id == id)
    }

    /// Entries in insertion order.
    pub fn all(&self) -> &[Entry] {
        &self.entries
    }

    /// Descriptors in insertion order, as stored in the snapshot.
    pub fn descriptors(&self) -> Vec<PeripheralDescriptor> {
        self.entries.iter().map(|entry| entry.descriptor.clone()).collect()
    }

    /// Ids of entries read by bulk telemetry.
    pub fn polled_ids(&self) -> Vec<SensorId> {
        self.entries
            .iter()
            .filter(|entry| entry.driver.is_polled())
            .map(Entry::id)
            .collect()
    }

    /// Ids of keypad entries.
    pub fn keypad_ids(&self) -> Vec<SensorId> {
        self.entries
            .iter()
            .filter(|entry| entry.kind() == PeripheralKind::MatrixKeypad)
            .map(Entry::id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take one reading from a peripheral.
    ///
    /// # Errors
    /// `RegistryError::NotFound` for an unknown id, `RegistryError::Driver`
    /// when the read fails.
    pub async fn read(&mut self, id: SensorId) -> RegistryResult<Reading> {
        let entry = self.find_mut(id).ok_or(RegistryError::NotFound(id))?;
        entry
            .driver
            .read()
            .await
            .map_err(|e| RegistryError::driver(id, e))
    }

    /// Scan a keypad once; yields a key on its press edge.
    pub async fn scan_keypad(&mut self, id: SensorId) -> RegistryResult<Option<char>> {
        let entry = self.find_mut(id).ok_or(RegistryError::NotFound(id))?;
        let keypad = entry
            .driver
            .as_keypad_mut()
            .ok_or_else(|| RegistryError::driver(id, HardwareError::unsupported("key scan")))?;
        keypad.scan().await.map_err(|e| RegistryError::driver(id, e))
    }

    /// Consume the calibration request stored in a distance sensor's attributes.
    ///
    /// Any pending request (attr1 != 0) is cleared from the descriptor and
    /// the snapshot, whether it is valid or not. A failed snapshot write
    /// leaves the registry dirty and does not hide the command.
    ///
    /// # Errors
    /// `RegistryError::NotFound` for an unknown id, `RegistryError::Validation`
    /// for a malformed request (which is still cleared).
    pub async fn take_calibration(
        &mut self,
        id: SensorId,
    ) -> RegistryResult<Option<CalibrationCommand>> {
        let entry = self.find_mut(id).ok_or(RegistryError::NotFound(id))?;
        let descriptor = &mut entry.descriptor;
        if descriptor.kind != PeripheralKind::DistanceSensor || descriptor.attr1 == 0 {
            return Ok(None);
        }

        let command = CalibrationCommand::from_descriptor(descriptor);
        descriptor.attr1 = 0;
        descriptor.attr2 = 0;
        debug!(%id, ?command, "calibration request consumed");

        // a failed write leaves the registry dirty for the next attempt
        let _ = self.persist().await;
        Ok(command?)
    }

    /// Run a calibration command on a distance sensor.
    ///
    /// Returns the raw distance used as the sample for `Calibrate`.
    pub async fn calibrate(
        &mut self,
        id: SensorId,
        command: CalibrationCommand,
    ) -> RegistryResult<Option<f64>> {
        let entry = self.find_mut(id).ok_or(RegistryError::NotFound(id))?;
        let sensor = entry
            .driver
            .as_distance_mut()
            .ok_or_else(|| RegistryError::driver(id, HardwareError::unsupported("calibration")))?;

        match command {
            CalibrationCommand::Calibrate { expected_cm } => sensor
                .calibrate(expected_cm)
                .await
                .map(Some)
                .map_err(|e| RegistryError::driver(id, e)),
            CalibrationCommand::Reset => {
                sensor.reset_calibration();
                Ok(None)
            }
        }
    }

    /// Drop every driver and forget every entry (factory reset).
    ///
    /// The snapshot is left alone; erasing it is the caller's job.
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.dirty = false;
        info!(dropped, "registry cleared");
    }

    /// Write the snapshot from the current entries.
    pub async fn persist(&mut self) -> RegistryResult<()> {
        match snapshot::save_snapshot(&self.store, &self.descriptors()).await {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                warn!(error = %e, "snapshot write failed, memory is ahead of disk");
                Err(RegistryError::Persistence(e))
            }
        }
    }

    /// Retry a pending snapshot write. Returns whether a write happened.
    pub async fn persist_if_dirty(&mut self) -> RegistryResult<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.persist().await?;
        info!("snapshot caught up with memory");
        Ok(true)
    }

    /// Whether memory holds changes the snapshot does not.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn store(&self) -> &AnyBlobStore {
        &self.store
    }

    pub fn board(&self) -> &BoardRef {
        &self.board
    }

    fn position(&self, id: SensorId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.descriptor.id == id)
    }
}
