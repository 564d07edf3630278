//! Error taxonomy and classification.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::messages::{provider_message, user_message};
use crate::{AuthError, Failure};

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// The closed set of error classes every auth failure is mapped to.
///
/// `Unknown` is the catch-all: classification never fails, it falls back
/// to `Unknown` when nothing more specific matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The device has no network at all.
    Offline,
    /// A request failed in transit or timed out.
    Network,
    /// The session is no longer valid.
    SessionExpired,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 403.
    Forbidden,
    /// HTTP 429 or a provider rate-limit code.
    RateLimited,
    /// The request was rejected as invalid (HTTP 400/422).
    Validation,
    /// The identity provider rejected the call with one of its own codes.
    IdentityProvider,
    /// Nothing more specific matched.
    Unknown,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 9] = [
        Self::Offline,
        Self::Network,
        Self::SessionExpired,
        Self::Unauthorized,
        Self::Forbidden,
        Self::RateLimited,
        Self::Validation,
        Self::IdentityProvider,
        Self::Unknown,
    ];

    /// The wire code for this kind, e.g. `"SESSION_EXPIRED"`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Offline => "OFFLINE",
            Self::Network => "NETWORK",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::RateLimited => "RATE_LIMITED",
            Self::Validation => "VALIDATION",
            Self::IdentityProvider => "IDENTITY_PROVIDER",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Kinds that are worth retrying locally.
    ///
    /// HTTP 5xx responses are also retried but classify as `Unknown`;
    /// see [`Classifier::is_retryable`].
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::RateLimited)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

/// Device-level network presence, consulted before anything else.
pub trait Connectivity: Send + Sync + 'static {
    /// `false` when the device has no network interface up at all.
    fn is_online(&self) -> bool;
}

/// Connectivity that always reports online. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// A shared online/offline switch the host flips from its own
/// network-change notifications.
#[derive(Debug, Clone)]
pub struct ConnectivityFlag(Arc<AtomicBool>);

impl ConnectivityFlag {
    pub fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    pub fn set_online(&self, online: bool) {
        let was = self.0.swap(online, Ordering::SeqCst);
        if was != online {
            tracing::info!(online, "connectivity changed");
        }
    }
}

impl Default for ConnectivityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Maps raw [`Failure`]s to [`ErrorKind`]s and builds normalized errors.
#[derive(Clone)]
pub struct Classifier {
    connectivity: Arc<dyn Connectivity>,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("online", &self.connectivity.is_online())
            .finish()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(AlwaysOnline)
    }
}

impl Classifier {
    pub fn new(connectivity: impl Connectivity) -> Self {
        Self {
            connectivity: Arc::new(connectivity),
        }
    }

    /// Classifies a failure. Total: every input, including `None`, yields
    /// exactly one kind.
    ///
    /// Precedence: device offline, then provider codes, then HTTP status,
    /// then message sniffing.
    pub fn classify(&self, failure: Option<&Failure>) -> ErrorKind {
        let Some(failure) = failure else {
            return ErrorKind::Unknown;
        };
        if !self.connectivity.is_online() {
            return ErrorKind::Offline;
        }
        match failure {
            Failure::Provider { code, .. } => classify_provider_code(code),
            Failure::Http { status, message } => classify_status(*status)
                .or_else(|| message.as_deref().map(sniff_message))
                .unwrap_or(ErrorKind::Unknown),
            Failure::Network(_) | Failure::Timeout(_) => ErrorKind::Network,
            Failure::Other(message) => sniff_message(message),
        }
    }

    /// Whether a failure of this kind should be retried locally.
    ///
    /// Transient kinds, plus any HTTP 5xx. Offline never retries:
    /// retrying immediately with no network is pointless.
    pub fn is_retryable(&self, kind: ErrorKind, failure: &Failure) -> bool {
        if kind == ErrorKind::Offline {
            return false;
        }
        kind.is_transient() || matches!(failure.http_status(), Some(500..=599))
    }

    /// Classifies `failure` and wraps it in a normalized [`AuthError`].
    pub fn normalize(&self, failure: Option<&Failure>, context: Option<&str>) -> AuthError {
        let kind = self.classify(failure);
        self.normalize_as(kind, failure, context)
    }

    /// Builds the normalized error for an already-classified failure.
    pub fn normalize_as(
        &self,
        kind: ErrorKind,
        failure: Option<&Failure>,
        context: Option<&str>,
    ) -> AuthError {
        let message = match (kind, failure) {
            (ErrorKind::IdentityProvider, Some(Failure::Provider { code, message })) => {
                provider_message(code)
                    .map(str::to_string)
                    .or_else(|| message.clone())
                    .unwrap_or_else(|| user_message(kind).to_string())
            }
            _ => user_message(kind).to_string(),
        };

        let error = AuthError {
            code: kind,
            message,
            details: failure.map(ToString::to_string),
            timestamp: Utc::now(),
            context: context.map(str::to_string),
            retryable: failure.is_some_and(|f| self.is_retryable(kind, f)),
        };
        warn!(
            code = %error.code,
            context = error.context.as_deref().unwrap_or("-"),
            details = error.details.as_deref().unwrap_or("-"),
            "auth error"
        );
        error
    }
}

fn classify_provider_code(code: &str) -> ErrorKind {
    let code = code.to_ascii_lowercase();
    if code.contains("rate_limit") {
        ErrorKind::RateLimited
    } else if code == "network_error" {
        ErrorKind::Network
    } else if code.contains("session") {
        ErrorKind::SessionExpired
    } else {
        ErrorKind::IdentityProvider
    }
}

fn classify_status(status: u16) -> Option<ErrorKind> {
    match status {
        401 => Some(ErrorKind::Unauthorized),
        403 => Some(ErrorKind::Forbidden),
        429 => Some(ErrorKind::RateLimited),
        400 | 422 => Some(ErrorKind::Validation),
        _ => None,
    }
}

/// Last resort: look for telltale words in a free-text message.
fn sniff_message(message: &str) -> ErrorKind {
    let msg = message.to_ascii_lowercase();
    if ["fetch", "network", "connection", "timed out", "timeout"]
        .iter()
        .any(|w| msg.contains(w))
    {
        ErrorKind::Network
    } else if msg.contains("too many requests") || msg.contains("rate limit") {
        ErrorKind::RateLimited
    } else if msg.contains("session") {
        ErrorKind::SessionExpired
    } else if msg.contains("unauthorized") {
        ErrorKind::Unauthorized
    } else if msg.contains("forbidden") {
        ErrorKind::Forbidden
    } else {
        ErrorKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn online() -> Classifier {
        Classifier::default()
    }

    fn offline() -> Classifier {
        Classifier::new(ConnectivityFlag::new(false))
    }

    #[test]
    fn test_classify_none_is_unknown() {
        assert_eq!(online().classify(None), ErrorKind::Unknown);
        assert_eq!(offline().classify(None), ErrorKind::Unknown);
    }

    #[test]
    fn test_classify_offline_wins_over_everything() {
        let c = offline();
        for f in [
            Failure::status(401),
            Failure::status(503),
            Failure::provider("session_expired"),
            Failure::Network("reset".into()),
            Failure::Other("whatever".into()),
        ] {
            assert_eq!(c.classify(Some(&f)), ErrorKind::Offline, "{f}");
        }
    }

    #[test]
    fn test_classify_http_statuses() {
        let c = online();
        let kind = |s| c.classify(Some(&Failure::status(s)));
        assert_eq!(kind(401), ErrorKind::Unauthorized);
        assert_eq!(kind(403), ErrorKind::Forbidden);
        assert_eq!(kind(429), ErrorKind::RateLimited);
        assert_eq!(kind(422), ErrorKind::Validation);
        assert_eq!(kind(400), ErrorKind::Validation);
        assert_eq!(kind(500), ErrorKind::Unknown);
        assert_eq!(kind(404), ErrorKind::Unknown);
    }

    #[test]
    fn test_classify_unmapped_status_falls_back_to_message() {
        let f = Failure::Http {
            status: 440,
            message: Some("Session timed out".into()),
        };
        // "timed out" is checked before "session".
        assert_eq!(online().classify(Some(&f)), ErrorKind::Network);

        let f = Failure::Http {
            status: 419,
            message: Some("session is gone".into()),
        };
        assert_eq!(online().classify(Some(&f)), ErrorKind::SessionExpired);
    }

    #[test]
    fn test_classify_provider_codes() {
        let c = online();
        let kind = |code: &str| c.classify(Some(&Failure::provider(code)));
        assert_eq!(kind("session_expired"), ErrorKind::SessionExpired);
        assert_eq!(kind("session_invalid"), ErrorKind::SessionExpired);
        assert_eq!(kind("rate_limit_exceeded"), ErrorKind::RateLimited);
        assert_eq!(kind("network_error"), ErrorKind::Network);
        assert_eq!(kind("form_password_incorrect"), ErrorKind::IdentityProvider);
        assert_eq!(kind("verification_expired"), ErrorKind::IdentityProvider);
    }

    #[test]
    fn test_classify_network_and_timeout() {
        let c = online();
        assert_eq!(
            c.classify(Some(&Failure::Network("dns".into()))),
            ErrorKind::Network
        );
        assert_eq!(
            c.classify(Some(&Failure::Timeout(std::time::Duration::from_secs(1)))),
            ErrorKind::Network
        );
    }

    #[test]
    fn test_classify_message_sniffing() {
        let c = online();
        let kind = |m: &str| c.classify(Some(&Failure::Other(m.into())));
        assert_eq!(kind("Failed to fetch"), ErrorKind::Network);
        assert_eq!(kind("Session not found"), ErrorKind::SessionExpired);
        assert_eq!(kind("Too Many Requests"), ErrorKind::RateLimited);
        assert_eq!(kind("Forbidden"), ErrorKind::Forbidden);
        assert_eq!(kind(""), ErrorKind::Unknown);
        assert_eq!(kind("¯\\_(ツ)_/¯"), ErrorKind::Unknown);
    }

    #[test]
    fn test_is_retryable_matrix() {
        let c = online();
        let retryable = |f: Failure| c.is_retryable(c.classify(Some(&f)), &f);
        assert!(retryable(Failure::Network("reset".into())));
        assert!(retryable(Failure::status(429)));
        assert!(retryable(Failure::status(500)));
        assert!(retryable(Failure::status(503)));
        assert!(!retryable(Failure::status(401)));
        assert!(!retryable(Failure::status(403)));
        assert!(!retryable(Failure::status(422)));
        assert!(!retryable(Failure::provider("form_password_incorrect")));
    }

    #[test]
    fn test_is_retryable_never_when_offline() {
        let c = offline();
        let f = Failure::status(503);
        assert!(!c.is_retryable(c.classify(Some(&f)), &f));
    }

    #[test]
    fn test_connectivity_flag_toggles() {
        let flag = ConnectivityFlag::default();
        let c = Classifier::new(flag.clone());
        let f = Failure::status(401);

        assert_eq!(c.classify(Some(&f)), ErrorKind::Unauthorized);
        flag.set_online(false);
        assert_eq!(c.classify(Some(&f)), ErrorKind::Offline);
    }

    #[test]
    fn test_normalize_provider_uses_code_table() {
        let err = online().normalize(
            Some(&Failure::provider("form_password_incorrect")),
            Some("sign-in"),
        );
        assert_eq!(err.code, ErrorKind::IdentityProvider);
        assert_eq!(err.message, "Incorrect password. Please try again.");
        assert_eq!(err.context.as_deref(), Some("sign-in"));
        assert!(!err.retryable);
    }

    #[test]
    fn test_normalize_unknown_keeps_raw_text_in_details_only() {
        let err = online().normalize(Some(&Failure::Other("boom".into())), None);
        assert_eq!(err.code, ErrorKind::Unknown);
        assert_eq!(err.message, user_message(ErrorKind::Unknown));
        assert_eq!(err.details.as_deref(), Some("boom"));
    }

    #[test]
    fn test_normalize_none_has_default_message() {
        let err = online().normalize(None, None);
        assert_eq!(err.code, ErrorKind::Unknown);
        assert_eq!(err.message, user_message(ErrorKind::Unknown));
        assert!(err.details.is_none());
    }

    #[test]
    fn test_error_kind_serializes_as_code() {
        for kind in ErrorKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.code()));
        }
    }
}
