//! Session lifecycle for Shipsmind: idle timeout, warning, and expiry.
//!
//! A signed-in session is watched by a small state machine:
//!
//! 1. **Activity**: an [`ActivityMonitor`] turns raw input events from
//!    an [`ActivityHub`] into at most one signal per throttle window.
//! 2. **Clock**: a [`SessionClock`] moves Active → Warning → Expired as
//!    idle time passes. Activity resets it while Active; only an explicit
//!    extend resets it during Warning.
//! 3. **Timeout actor**: [`spawn_session_timeout`] drives the clock on
//!    real deadlines, publishes a [`SessionView`] for the UI, and on
//!    expiry signs out through the [`IdentityProvider`] exactly once
//!    before redirecting through the [`Navigator`].
//!
//! # How it fits in the stack
//!
//! ```text
//! Host UI (above)  ← renders SessionView, calls extend / sign_out_now
//!     ↕
//! Session layer (this crate)  ← clock, monitor, timeout actor
//!     ↕
//! Timing / Retry layers (below)  ← Throttle, Failure
//! ```

mod activity;
mod clock;
mod config;
mod error;
mod provider;
mod state;
mod timeout;

pub use activity::{ActivityHub, ActivityKind, ActivityMonitor};
pub use clock::{ExpiryReason, ResetCause, SessionClock, Transition, format_countdown};
pub use config::SessionConfig;
pub use error::SessionError;
pub use provider::{
    IdentityProvider, Navigator, SESSION_EXPIRED_ROUTE, SIGN_IN_ROUTE, SessionInfo,
};
pub use state::{Phase, SessionEvent, SessionState};
pub use timeout::{SessionTimeoutHandle, SessionView, spawn_session_timeout, spawn_with_clock};
