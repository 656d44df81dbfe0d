//! Applies inbound reconfiguration requests to the registry.
//!
//! ```text
//! topic, payload ──► Request::route ──► handle_{set,get,remove,reset}
//!                                              │
//!                                   SharedRegistry (locked per request)
//!                                              │
//!                                              ▼
//!                                   Dispatch::Reply { topic, payload }
//! ```

use crate::error::{ProtocolError, ProtocolResult};
use crate::payload::{decode_remove_payload, encode_descriptor_list};
use crate::response::{RemoveResponse, SetResponse};
use crate::topic::Request;
use sensorlink_core::{DeviceId, decode_set_value};
use sensorlink_registry::SharedRegistry;
use sensorlink_storage::erase_configuration;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Reply to publish on a response topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub topic: String,
    pub payload: String,
}

/// What the connection task must do after a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Publish this reply.
    Reply(Reply),
    /// Configuration was erased; the process must restart.
    Restart,
}

/// Reconfiguration endpoint of one device.
#[derive(Debug, Clone)]
pub struct ProtocolHandler {
    device: DeviceId,
    registry: SharedRegistry,
}

impl ProtocolHandler {
    pub fn new(device: DeviceId, registry: SharedRegistry) -> Self {
        Self { device, registry }
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Route and answer one inbound message.
    ///
    /// # Errors
    /// `ProtocolError::UnknownTopic` for topics that are not request topics of
    /// this device; the message should be ignored.
    pub async fn handle(&self, topic: &str, payload: &[u8]) -> ProtocolResult<Dispatch> {
        let request = Request::route(&self.device, topic)
            .ok_or_else(|| ProtocolError::UnknownTopic(topic.to_string()))?;
        debug!(%request, topic, bytes = payload.len(), "request received");

        let body = match request {
            Request::Set => self.handle_set(payload).await.to_string(),
            Request::Get => self.handle_get().await?,
            Request::Remove => self.handle_remove(payload).await.to_string(),
            Request::Reset => {
                self.handle_reset().await?;
                return Ok(Dispatch::Restart);
            }
        };

        let topic = request
            .response_topic(&self.device)
            .ok_or_else(|| ProtocolError::UnknownTopic(topic.to_string()))?;
        Ok(Dispatch::Reply(Reply {
            topic,
            payload: body,
        }))
    }

    /// Add or update one descriptor or a `{"sensors": [...]}` batch.
    ///
    /// Items are applied in order; a failing item does not stop the rest.
    pub async fn handle_set(&self, payload: &[u8]) -> SetResponse {
        let value: Value = match serde_json::from_slice(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "set request is not JSON");
                return SetResponse::InvalidJson;
            }
        };

        let batch = match decode_set_value(&value) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "set request rejected");
                return SetResponse::Error;
            }
        };

        let mut registry = self.registry.lock().await;
        let (mut processed, mut errors) = (0, 0);
        for item in batch {
            let result = match item {
                Ok(descriptor) => registry.add_or_update(descriptor).await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match result {
                Ok(outcome) => {
                    processed += 1;
                    debug!(?outcome, "descriptor applied");
                }
                Err(error) => {
                    errors += 1;
                    warn!(%error, "descriptor rejected");
                }
            }
        }

        let response = SetResponse::from_counts(processed, errors);
        info!(processed, errors, "set request handled");
        response
    }

    /// Every descriptor, in registry order.
    ///
    /// # Errors
    /// `ProtocolError::Encode` if the list cannot be serialized.
    pub async fn handle_get(&self) -> ProtocolResult<String> {
        let descriptors = self.registry.lock().await.descriptors();
        debug!(count = descriptors.len(), "descriptor list requested");
        Ok(encode_descriptor_list(&descriptors)?)
    }

    /// Remove the peripherals named by `{id}` or `[{id}, ...]`.
    pub async fn handle_remove(&self, payload: &[u8]) -> RemoveResponse {
        let ids = match decode_remove_payload(payload) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "remove request rejected");
                return RemoveResponse::Error;
            }
        };

        match self.registry.lock().await.remove(&ids).await {
            Ok(removed) => RemoveResponse::Ok { removed },
            Err(e) => {
                warn!(error = %e, "remove request failed");
                RemoveResponse::Error
            }
        }
    }

    /// Drop every peripheral and erase the stored configuration.
    ///
    /// # Errors
    /// `ProtocolError::Reset` if a blob could not be erased. The registry is
    /// cleared regardless.
    pub async fn handle_reset(&self) -> ProtocolResult<()> {
        let mut registry = self.registry.lock().await;
        registry.clear();
        erase_configuration(registry.store())
            .await
            .map_err(ProtocolError::Reset)?;
        info!(device = %self.device, "factory reset done");
        Ok(())
    }
}
