//! Retrying publisher for protocol replies.

use crate::error::TransportResult;
use crate::transport::Transport;
use sensorlink_core::constants::{RESPONSE_PUBLISH_ATTEMPTS, RESPONSE_RETRY_DELAY_MS};
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded retry of a single publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: RESPONSE_PUBLISH_ATTEMPTS,
            delay: Duration::from_millis(RESPONSE_RETRY_DELAY_MS),
        }
    }
}

/// Publish, retrying up to `policy.attempts` times with `policy.delay` between
/// attempts.
///
/// # Errors
/// Returns the last failure once every attempt failed.
pub async fn publish_with_retry<T: Transport>(
    transport: &T,
    topic: &str,
    payload: &[u8],
    policy: RetryPolicy,
) -> TransportResult<()> {
    let mut attempt = 1;
    loop {
        match transport.publish(topic, payload.to_vec()).await {
            Ok(()) => {
                debug!(topic, attempt, "reply published");
                return Ok(());
            }
            Err(e) if attempt < policy.attempts => {
                warn!(topic, attempt, error = %e, "publish failed, retrying");
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                warn!(topic, attempt, error = %e, "publish failed, giving up");
                return Err(e);
            }
        }
    }
}
