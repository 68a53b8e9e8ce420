use crate::domain::ports::RequestCacheRef;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(10);

/// Periodically drops idempotency keys past their retention window.
///
/// Runs until the returned handle is aborted or the runtime shuts down.
pub fn spawn_retention_sweep(cache: RequestCacheRef, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(MIN_SWEEP_PERIOD));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!(purged, "purged expired idempotency keys");
            }
        }
    })
}
