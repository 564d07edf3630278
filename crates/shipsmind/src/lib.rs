//! # Shipsmind
//!
//! Session lifecycle support for signed-in clients: an idle timeout with
//! a warning countdown, retried and classified auth calls, short-lived
//! caches, and cached user preferences.
//!
//! Everything hangs off one [`SessionSupport`] context:
//!
//! ```text
//! SessionSupport
//!  ├ start_session_timeout → SessionTimeoutHandle (watch SessionView)
//!  ├ run_with_retry        → RetryRunner (classify + backoff)
//!  ├ preferences           → PreferencesService (cache-first)
//!  ├ session_info / check_route_access (cached 30 s / 60 s)
//!  └ spawn_sweeper         → purges expired entries every 60 s
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shipsmind::prelude::*;
//!
//! let support = SessionSupport::new(SupportConfig::default(), my_provider);
//! let hub = ActivityHub::default();
//! let timeout = support.start_session_timeout(my_navigator, &hub);
//! let _sweeper = support.spawn_sweeper();
//!
//! // Feed input events into the hub; render timeout.subscribe().
//! hub.emit(ActivityKind::KeyPress);
//! ```

mod caches;
mod config;
mod error;
mod support;

pub use caches::{CacheStats, SupportCaches, route_key, session_key};
pub use config::{RetrySettings, SupportConfig};
pub use error::ShipsmindError;
pub use support::{
    ROUTE_CONTEXT, SESSION_CONTEXT, SessionSupport, VERIFY_ATTEMPT_CONTEXT, VERIFY_PREPARE_CONTEXT,
};

pub use shipsmind_cache as cache;
pub use shipsmind_prefs as prefs;
pub use shipsmind_retry as retry;
pub use shipsmind_session as session;
pub use shipsmind_timing as timing;

/// Convenient re-exports for hosts.
///
/// ```rust
/// use shipsmind::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{SessionSupport, ShipsmindError, SupportConfig};
    pub use shipsmind_prefs::{AutoSave, Preferences, PreferencesApi, PreferencesUpdate, Theme};
    pub use shipsmind_retry::{AuthError, ErrorKind, Failure, UserFacingError};
    pub use shipsmind_session::{
        ActivityHub, ActivityKind, IdentityProvider, Navigator, SessionConfig, SessionInfo,
        SessionTimeoutHandle, SessionView,
    };
}
