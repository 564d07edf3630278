//! User activity detection.
//!
//! The host (a UI shell, a terminal, a test) pushes raw input events into
//! an [`ActivityHub`]. An [`ActivityMonitor`] subscribes to the hub,
//! keeps only the kinds it was asked to watch, throttles them, and calls
//! back at most once per window.
//!
//! ```text
//! host input ──emit──→ ActivityHub (broadcast) ──→ ActivityMonitor task
//!                                                   ├ filter by kind
//!                                                   ├ Throttle (30 s)
//!                                                   └ on_activity()
//! ```

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shipsmind_timing::Throttle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// The input events that count as "the user is still here".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PointerDown,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
}

impl ActivityKind {
    /// Every kind; the default watch set.
    pub const ALL: [ActivityKind; 6] = [
        Self::PointerDown,
        Self::PointerMove,
        Self::KeyPress,
        Self::Scroll,
        Self::TouchStart,
        Self::Click,
    ];
}

/// Fan-out point for raw input events.
///
/// Cheap to clone; all clones share one channel.
#[derive(Debug, Clone)]
pub struct ActivityHub {
    sender: broadcast::Sender<ActivityKind>,
}

impl ActivityHub {
    /// Capacity used by [`Default`]. Pointer moves arrive in bursts; a
    /// monitor that lags just skips ahead.
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes one input event. Returns how many listeners saw it.
    pub fn emit(&self, kind: ActivityKind) -> usize {
        self.sender.send(kind).unwrap_or(0)
    }

    /// How many monitors are currently attached.
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn subscribe(&self) -> broadcast::Receiver<ActivityKind> {
        self.sender.subscribe()
    }
}

impl Default for ActivityHub {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Watches an [`ActivityHub`] and reports throttled activity.
///
/// While attached, the monitor holds one hub subscription. Detaching (or
/// dropping the monitor) releases it.
#[derive(Debug)]
pub struct ActivityMonitor {
    hub: ActivityHub,
    window: Duration,
    task: Option<JoinHandle<()>>,
}

impl ActivityMonitor {
    pub fn new(hub: &ActivityHub, window: Duration) -> Self {
        Self {
            hub: hub.clone(),
            window,
            task: None,
        }
    }

    /// Starts listening for `kinds`, calling `on_activity` for the first
    /// matching event and then at most once per throttle window.
    ///
    /// Attaching again replaces the previous listener and starts a fresh
    /// throttle window. Must be called from inside a Tokio runtime.
    pub fn attach<F>(&mut self, kinds: &[ActivityKind], on_activity: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.detach();

        // Subscribe before spawning so events emitted right after attach
        // are not missed.
        let mut events = self.hub.subscribe();
        let kinds: HashSet<ActivityKind> = kinds.iter().copied().collect();
        let watched = kinds.len();
        let mut throttle = Throttle::new(self.window);

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(kind) if kinds.contains(&kind) => {
                        if throttle.should_fire(Instant::now()) {
                            trace!(?kind, "activity detected");
                            on_activity();
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        trace!(skipped, "activity monitor lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        debug!(kinds = watched, "activity monitor attached");
        self.task = Some(task);
    }

    /// Stops listening. Safe to call any number of times.
    pub fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("activity monitor detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Drop for ActivityMonitor {
    fn drop(&mut self) {
        self.detach();
    }
}
