//! Durable snapshot of every configured peripheral (`devices.json`).
//!
//! The snapshot is a JSON array of descriptors in registry order. Loading
//! returns the raw array items so the caller can decode each one on its own
//! and drop only the entries that fail.

use crate::error::{StorageError, StorageResult};
use crate::store::BlobStore;
use sensorlink_core::PeripheralDescriptor;
use sensorlink_core::constants::SNAPSHOT_BLOB;
use serde_json::Value;
use tracing::debug;

/// Parse snapshot bytes into its array items.
///
/// Blank content counts as an empty snapshot.
///
/// # Errors
/// Returns `StorageError::Corrupt` if the content is not a JSON array.
pub fn decode_snapshot(bytes: &[u8]) -> StorageResult<Vec<Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(StorageError::corrupt(
            SNAPSHOT_BLOB,
            format!("expected an array, found {}", json_kind(&other)),
        )),
        Err(e) => Err(StorageError::corrupt(SNAPSHOT_BLOB, e.to_string())),
    }
}

/// Serialize descriptors in snapshot format.
pub fn encode_snapshot(descriptors: &[PeripheralDescriptor]) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(descriptors)?)
}

/// Read the snapshot; `Ok(None)` when none was ever written.
pub async fn load_snapshot<S: BlobStore>(store: &S) -> StorageResult<Option<Vec<Value>>> {
    match store.read(SNAPSHOT_BLOB).await? {
        Some(bytes) => decode_snapshot(&bytes).map(Some),
        None => Ok(None),
    }
}

/// Replace the snapshot with `descriptors`.
pub async fn save_snapshot<S: BlobStore>(
    store: &S,
    descriptors: &[PeripheralDescriptor],
) -> StorageResult<()> {
    let bytes = encode_snapshot(descriptors)?;
    store.write(SNAPSHOT_BLOB, &bytes).await?;
    debug!(entries = descriptors.len(), "snapshot saved");
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
