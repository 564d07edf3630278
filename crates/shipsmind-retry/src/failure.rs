//! Raw failures reported by outbound calls, before classification.

use std::time::Duration;

/// What went wrong with an outbound call, as reported by the caller.
///
/// This is deliberately close to the shapes the outside world produces
/// (a transport exception, an HTTP response, a provider error code).
/// The [`Classifier`](crate::Classifier) turns it into an
/// [`ErrorKind`](crate::ErrorKind).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    /// The request never got a response (DNS, connection reset, etc.).
    #[error("network failure: {0}")]
    Network(String),

    /// The request didn't complete within the per-attempt timeout.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The server answered with a non-success status.
    #[error("http {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Http {
        status: u16,
        message: Option<String>,
    },

    /// The identity provider rejected the call with one of its own codes,
    /// e.g. `form_password_incorrect` or `session_expired`.
    #[error("identity provider error {code}: {}", .message.as_deref().unwrap_or("no message"))]
    Provider {
        code: String,
        message: Option<String>,
    },

    /// Anything else; only its message is available for classification.
    #[error("{0}")]
    Other(String),
}

impl Failure {
    /// Shorthand for an HTTP failure with no body message.
    pub fn status(status: u16) -> Self {
        Self::Http {
            status,
            message: None,
        }
    }

    /// Shorthand for a provider failure with no message.
    pub fn provider(code: impl Into<String>) -> Self {
        Self::Provider {
            code: code.into(),
            message: None,
        }
    }

    /// The HTTP status, if this failure carries one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The free-text message attached to this failure, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Network(msg) | Self::Other(msg) => Some(msg),
            Self::Http { message, .. } | Self::Provider { message, .. } => message.as_deref(),
            Self::Timeout(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_http_without_message() {
        assert_eq!(Failure::status(503).to_string(), "http 503: no message");
    }

    #[test]
    fn test_display_timeout_in_millis() {
        let f = Failure::Timeout(Duration::from_secs(15));
        assert_eq!(f.to_string(), "request timed out after 15000ms");
    }

    #[test]
    fn test_http_status_only_for_http() {
        assert_eq!(Failure::status(429).http_status(), Some(429));
        assert_eq!(Failure::Network("reset".into()).http_status(), None);
    }

    #[test]
    fn test_message_accessor() {
        let f = Failure::Http {
            status: 500,
            message: Some("db down".into()),
        };
        assert_eq!(f.message(), Some("db down"));
        assert_eq!(Failure::provider("user_locked").message(), None);
    }
}
