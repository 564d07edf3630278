//! Trailing-edge debounce backed by a generation counter.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// Delays an action until a quiet period has passed since the last call.
///
/// Every [`call`](Self::call) bumps a shared generation number and spawns
/// a task that sleeps for `delay`. When the sleep ends, the task only runs
/// its action if no newer call has bumped the generation in the meantime.
/// So within a burst of calls only the last one runs; earlier ones are
/// superseded.
///
/// An action that has already started is never interrupted: a call that
/// arrives while a save is in flight schedules its own save rather than
/// aborting the running one.
///
/// Must be used from inside a Tokio runtime.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    /// Quiet period used for preference auto-save.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

    /// Creates a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedules `action`, superseding any call still waiting out its delay.
    ///
    /// The returned handle resolves to `true` if the action ran and `false`
    /// if a later call (or [`cancel`](Self::cancel)) superseded it.
    pub fn call<F>(&self, action: F) -> JoinHandle<bool>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) != mine {
                trace!(generation = mine, "debounced call superseded");
                return false;
            }
            action.await;
            true
        })
    }

    /// Drops whatever call is currently waiting.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// The configured quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}
