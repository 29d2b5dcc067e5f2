//! Background persistence: write a snapshot every `interval`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::app::services::RegistrationService;

/// Spawn the periodic snapshot writer. Failures are logged and retried on
/// the next tick; the task runs until aborted.
pub fn spawn_periodic(services: Arc<RegistrationService>, path: PathBuf, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; startup state is already on disk.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match services.write_snapshot(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "periodic snapshot written"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "periodic snapshot failed"),
            }
        }
    })
}
