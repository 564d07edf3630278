//! The normalized error every wrapped call surfaces.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{DisplayMode, ErrorKind, UserFacingError};

/// A classified, user-presentable auth error.
///
/// `message` is always safe to show. `details` carries the raw failure
/// text and should only ever be shown behind an explicit disclosure
/// outside production (see [`UserFacingError`]).
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct AuthError {
    /// Which class of error this is.
    pub code: ErrorKind,
    /// Short non-technical sentence.
    pub message: String,
    /// Raw technical description of the underlying failure.
    pub details: Option<String>,
    /// When the error was normalized.
    pub timestamp: DateTime<Utc>,
    /// The retry context (operation name) the error came from.
    pub context: Option<String>,
    /// Whether the underlying failure was of a retryable class.
    /// `true` on an error returned from `run` means retries ran out.
    pub retryable: bool,
}

impl AuthError {
    /// The view a dialog should render for this error.
    pub fn to_user_facing(&self, mode: DisplayMode) -> UserFacingError {
        UserFacingError::from_error(self, mode)
    }

    /// Whether the fix is to sign in again.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self.code, ErrorKind::SessionExpired | ErrorKind::Unauthorized)
    }
}
