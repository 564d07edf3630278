//! Leading-edge throttle as an explicit state object.

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

/// Rate-limits a repeated signal to at most once per `window`.
///
/// The first signal fires immediately and opens a window. Every signal
/// that arrives before the window closes is dropped; there is no
/// trailing call, nothing is queued.
///
/// ```text
/// events:  x  x x   x        x   x
/// fired:   ✓                 ✓
///          |<-- window -->|  |<-- window -->|
/// ```
#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    /// When the last signal was let through. `None` until the first one.
    last_fired: Option<Instant>,
}

impl Throttle {
    /// Window used for session activity when nothing else is configured.
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30);

    /// Creates a throttle with the given window. A zero window lets every
    /// signal through.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: None,
        }
    }

    /// Decides whether a signal arriving at `now` should fire.
    ///
    /// Returns `true` and starts a new window when no window is open;
    /// returns `false` (and changes nothing) while one is.
    pub fn should_fire(&mut self, now: Instant) -> bool {
        if !self.is_open(now) {
            trace!(
                window_ms = self.window.as_millis() as u64,
                "throttled signal dropped"
            );
            return false;
        }
        self.last_fired = Some(now);
        true
    }

    /// Whether a signal at `now` would fire, without recording it.
    pub fn is_open(&self, now: Instant) -> bool {
        match self.last_fired {
            Some(last) => now.saturating_duration_since(last) >= self.window,
            None => true,
        }
    }

    /// Forgets the last fire time so the next signal goes through.
    pub fn reset(&mut self) {
        self.last_fired = None;
    }

    /// The configured window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// When the last signal fired, if any has.
    pub fn last_fired(&self) -> Option<Instant> {
        self.last_fired
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}
