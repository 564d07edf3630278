//! Retry and error classification for session-dependent calls.
//!
//! Any call that needs a valid session (preference loads and saves,
//! verification, session lookups) goes through [`RetryRunner::run`]:
//!
//! 1. The operation reports failures as a raw [`Failure`].
//! 2. The [`Classifier`] maps it to one of nine [`ErrorKind`]s.
//!    Precedence: device offline → provider code → HTTP status →
//!    message sniffing.
//! 3. Transient kinds (network, rate limit, HTTP 5xx) are retried with
//!    exponential backoff; everything else surfaces immediately as a
//!    normalized [`AuthError`].
//! 4. [`user_message`] and [`UserFacingError`] turn a kind into text that
//!    is safe to show a user.
//!
//! # How it fits in the stack
//!
//! ```text
//! Preferences / Session layers (above)  ← wrap their calls in run()
//!     ↕
//! Retry layer (this crate)  ← classify, back off, normalize
//!     ↕
//! Identity provider / HTTP store (external)  ← produce Failure values
//! ```

mod classify;
mod error;
mod failure;
mod messages;
mod runner;

pub use classify::{AlwaysOnline, Classifier, Connectivity, ConnectivityFlag, ErrorKind};
pub use error::AuthError;
pub use failure::Failure;
pub use messages::{DisplayMode, UserFacingError, provider_message, user_message};
pub use runner::{RetryPolicy, RetryRunner};
