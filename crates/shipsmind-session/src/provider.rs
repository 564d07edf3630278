//! Hooks into the outside world: the identity provider and navigation.
//!
//! The session layer never talks to an auth service or a router
//! directly. The host implements these traits, the same way it plugs in
//! its own transport or storage elsewhere.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shipsmind_retry::Failure;

/// Where the user lands after the session expired and sign-out worked.
pub const SESSION_EXPIRED_ROUTE: &str = "/sign-in?message=session_expired";

/// Where the user lands when sign-out itself failed.
pub const SIGN_IN_ROUTE: &str = "/sign-in";

/// What the identity provider knows about the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub user_id: String,
    /// Provider status string, e.g. `active` or `expired`.
    pub status: String,
    #[serde(default)]
    pub last_active_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expire_at: Option<DateTime<Utc>>,
}

impl SessionInfo {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// The external identity provider.
///
/// Every method reports failures as a raw [`Failure`] so the retry layer
/// can classify them.
///
/// # Trait bounds
///
/// The returned futures are `Send` because the session timeout runs as
/// its own Tokio task and calls `sign_out` from there. Implementations
/// can still be written with `async fn`.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Ends the session on the provider side.
    fn sign_out(&self) -> impl Future<Output = Result<(), Failure>> + Send;

    /// Looks up the current session, `None` if signed out.
    fn current_session(&self) -> impl Future<Output = Result<Option<SessionInfo>, Failure>> + Send;

    /// Sends a verification code to the user's email address.
    fn prepare_verification(&self) -> impl Future<Output = Result<(), Failure>> + Send;

    /// Submits the code the user typed in.
    fn attempt_verification(&self, code: &str) -> impl Future<Output = Result<(), Failure>> + Send;
}

impl<P: IdentityProvider> IdentityProvider for Arc<P> {
    fn sign_out(&self) -> impl Future<Output = Result<(), Failure>> + Send {
        (**self).sign_out()
    }

    fn current_session(&self) -> impl Future<Output = Result<Option<SessionInfo>, Failure>> + Send {
        (**self).current_session()
    }

    fn prepare_verification(&self) -> impl Future<Output = Result<(), Failure>> + Send {
        (**self).prepare_verification()
    }

    fn attempt_verification(&self, code: &str) -> impl Future<Output = Result<(), Failure>> + Send {
        (**self).attempt_verification(code)
    }
}

/// Moves the user to another route. Fire-and-forget.
pub trait Navigator: Send + Sync + 'static {
    fn redirect(&self, route: &str);
}

impl<N: Navigator> Navigator for Arc<N> {
    fn redirect(&self, route: &str) {
        (**self).redirect(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_info_uses_camel_case() {
        let json = r#"{"sessionId":"sess_1","userId":"user_1","status":"active"}"#;
        let info: SessionInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.session_id, "sess_1");
        assert!(info.is_active());
        assert!(info.expire_at.is_none());
    }
}
