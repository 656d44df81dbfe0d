//! Simulated environment for `--simulate` runs.

use sensorlink_hardware::mock::MockBoard;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How often the simulated world moves on.
pub const ANIMATION_STEP: Duration = Duration::from_millis(500);

/// Keep moving the simulated world until `cancel` fires.
pub async fn animate(board: MockBoard, step: Duration, cancel: CancellationToken) {
    let started = Instant::now();
    let mut ticker = tokio::time::interval(step);
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => board.animate(started.elapsed().as_secs_f64()),
        }
    }
    debug!("simulation stopped");
}
