//! Background purge of expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Anything whose expired entries can be purged in one pass.
pub trait Sweep: Send + Sync + 'static {
    /// Removes expired entries, returning how many.
    fn sweep_expired(&self) -> usize;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}

/// Owns the sweeper task. Dropping the handle stops the sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stops the sweeper. Idempotent.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns a task that sweeps every cache in `caches` once per `interval`.
///
/// The first sweep happens one full interval after spawning. If the task
/// falls behind (e.g. the host was suspended), missed sweeps are skipped
/// rather than run back to back.
///
/// Must be called from inside a Tokio runtime.
pub fn spawn_sweeper(caches: Vec<Arc<dyn Sweep>>, interval: Duration) -> SweeperHandle {
    // Anchor the schedule now, not when the task first gets polled.
    let first = Instant::now() + interval;
    let task = tokio::spawn(async move {
        let mut ticker = time::interval_at(first, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(
            caches = caches.len(),
            interval_ms = interval.as_millis() as u64,
            "cache sweeper started"
        );

        loop {
            ticker.tick().await;
            for cache in &caches {
                let removed = cache.sweep_expired();
                if removed > 0 {
                    debug!(cache = cache.name(), removed, "swept expired entries");
                } else {
                    trace!(cache = cache.name(), "sweep found nothing expired");
                }
            }
        }
    });
    SweeperHandle { task }
}
