//! Persisted connection settings.
//!
//! - `mqtt.json`: broker host, port and device id, written when the node is
//!   paired with a broker.
//! - `topics.json`: topics to subscribe to after every (re)connection. When
//!   the list is missing or empty, the default reconfiguration topics for the
//!   device are written and used.

use crate::error::{StorageError, StorageResult};
use crate::store::BlobStore;
use sensorlink_core::DeviceId;
use sensorlink_core::constants::{
    BROKER_SETTINGS_BLOB, TOPIC_DEVICE_RESET, TOPIC_SENSORS_GET, TOPIC_SENSORS_REMOVE,
    TOPIC_SENSORS_SET, TOPICS_BLOB,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Broker the node connects to, as saved at pairing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerSettings {
    pub broker: String,
    pub port: u16,
    pub id: DeviceId,
}

impl BrokerSettings {
    pub fn new(broker: impl Into<String>, port: u16, id: DeviceId) -> Self {
        Self {
            broker: broker.into(),
            port,
            id,
        }
    }

    /// Read saved settings; `Ok(None)` when the node was never paired.
    ///
    /// # Errors
    /// Returns `StorageError::Corrupt` if the blob is not valid settings, or
    /// names an empty broker.
    pub async fn load<S: BlobStore>(store: &S) -> StorageResult<Option<Self>> {
        let Some(bytes) = store.read(BROKER_SETTINGS_BLOB).await? else {
            return Ok(None);
        };

        let settings: Self = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::corrupt(BROKER_SETTINGS_BLOB, e.to_string()))?;
        if settings.broker.trim().is_empty() {
            return Err(StorageError::corrupt(BROKER_SETTINGS_BLOB, "empty broker"));
        }
        Ok(Some(settings))
    }

    pub async fn save<S: BlobStore>(&self, store: &S) -> StorageResult<()> {
        store
            .write(BROKER_SETTINGS_BLOB, &serde_json::to_vec(self)?)
            .await?;
        info!(broker = %self.broker, port = self.port, id = %self.id, "broker settings saved");
        Ok(())
    }
}

/// Topics subscribed at every connection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicList(Vec<String>);

impl TopicList {
    /// Reconfiguration topics of `device`.
    pub fn defaults_for(device: &DeviceId) -> Self {
        Self(
            [
                TOPIC_SENSORS_GET,
                TOPIC_SENSORS_SET,
                TOPIC_SENSORS_REMOVE,
                TOPIC_DEVICE_RESET,
            ]
            .iter()
            .map(|suffix| format!("{device}/{suffix}"))
            .collect(),
        )
    }

    /// Saved list, or the defaults for `device` (saved on the way) when the
    /// list is missing or holds no usable topic.
    pub async fn load_or_default<S: BlobStore>(store: &S, device: &DeviceId) -> StorageResult<Self> {
        if let Some(bytes) = store.read(TOPICS_BLOB).await? {
            let list: Self = serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::corrupt(TOPICS_BLOB, e.to_string()))?;
            let list = list.normalized();
            if !list.is_empty() {
                debug!(topics = list.len(), "topic list loaded");
                return Ok(list);
            }
        }

        let defaults = Self::defaults_for(device);
        store.write(TOPICS_BLOB, &serde_json::to_vec(&defaults)?).await?;
        info!(%device, "default topic list written");
        Ok(defaults)
    }

    /// Trimmed, without blanks.
    fn normalized(self) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|topic| topic.trim().to_string())
                .filter(|topic| !topic.is_empty())
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for TopicList {
    fn from(topics: Vec<String>) -> Self {
        Self(topics)
    }
}
