//! Timing primitives for Shipsmind session support.
//!
//! Three small pieces live here, each split into a pure decision and a thin
//! runtime adapter so the decision can be tested without a real clock:
//!
//! - [`Throttle`]: "at most once per window" gate for activity signals.
//!   The decision is [`Throttle::should_fire`], a pure function of `now`.
//! - [`Debouncer`]: "only the last call within the quiet period runs",
//!   used for settings auto-save. Superseded calls are dropped, not queued.
//! - [`PerformanceMonitor`]: rolling per-operation duration samples with
//!   count/avg/min/max and target checks.
//!
//! All timestamps are [`tokio::time::Instant`], so tests can drive them with
//! `#[tokio::test(start_paused = true)]` and `tokio::time::advance`.
//!
//! # Integration
//!
//! ```ignore
//! let mut throttle = Throttle::new(Duration::from_secs(30));
//! while let Ok(event) = events.recv().await {
//!     if throttle.should_fire(Instant::now()) {
//!         on_activity();
//!     }
//! }
//! ```

mod debounce;
mod monitor;
mod throttle;

pub use debounce::Debouncer;
pub use monitor::{OperationStats, PerformanceMonitor, PerformanceTargets, TimingGuard};
pub use throttle::Throttle;
