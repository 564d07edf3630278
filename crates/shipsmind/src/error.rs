//! Unified error type for Shipsmind.

use shipsmind_retry::AuthError;
use shipsmind_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ShipsmindError {
    /// A session timeout error (expired, timeout task gone).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A classified failure from a wrapped call.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
