//! Error types for the session layer.

/// Errors that can occur while driving a session's timeout clock.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The session already expired. Expiry is terminal: extending or
    /// signing out again has no effect, and a fresh sign-in starts a new
    /// session.
    #[error("session {0} has expired")]
    Expired(String),

    /// The timeout task for this session is no longer running (it was
    /// shut down, or every handle was dropped).
    #[error("session timeout for {0} is not running")]
    Unavailable(String),
}
