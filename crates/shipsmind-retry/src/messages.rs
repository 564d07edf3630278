//! User-facing text for auth errors.

use serde::{Deserialize, Serialize};

use crate::{AuthError, ErrorKind};

/// A short, non-technical sentence for each kind. Total over [`ErrorKind`].
pub fn user_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Network => {
            "Network connection issue. Please check your internet and try again."
        }
        ErrorKind::Offline => {
            "You appear to be offline. Please check your connection and try again."
        }
        ErrorKind::SessionExpired => {
            "Your session has expired for security reasons. Please sign in again."
        }
        ErrorKind::Unauthorized => "You need to sign in to access this feature.",
        ErrorKind::Forbidden => "You do not have permission to access this resource.",
        ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.",
        ErrorKind::Validation => "Please check your input and try again.",
        ErrorKind::IdentityProvider => "Authentication service error. Please try again.",
        ErrorKind::Unknown => "An unexpected error occurred. Please try again.",
    }
}

/// Friendlier text for identity-provider codes we know about.
pub fn provider_message(code: &str) -> Option<&'static str> {
    let msg = match code {
        "session_invalid" => "Your session is invalid. Please sign in again.",
        "session_expired" => "Your session has expired. Please sign in again.",
        "session_not_found" => "Session not found. Please sign in again.",
        "user_not_found" => "User account not found. Please check your credentials.",
        "user_locked" => "Your account has been temporarily locked. Please contact support.",
        "user_banned" => "Your account has been suspended. Please contact support.",
        "form_identifier_exists" => {
            "An account with this email already exists. Please sign in or use a different email."
        }
        "form_password_incorrect" => "Incorrect password. Please try again.",
        "form_password_pwned" => {
            "This password has been found in a data breach. Please choose a more secure password."
        }
        "form_username_invalid" => "Please enter a valid email address.",
        "verification_invalid" => {
            "Invalid verification code. Please check the code and try again."
        }
        "verification_expired" => "Verification code has expired. Please request a new one.",
        "verification_failed" => "Verification failed. Please try again.",
        "rate_limit_exceeded" => "Too many attempts. Please wait a few minutes before trying again.",
        "network_error" => "Network error occurred. Please check your connection and try again.",
        _ => return None,
    };
    Some(msg)
}

/// Whether technical details may be shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Details are never shown.
    #[default]
    Production,
    /// Details are available behind an explicit disclosure.
    Development,
}

/// What a dialog or toast shows for an [`AuthError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserFacingError {
    pub title: &'static str,
    pub message: String,
    /// Label for the suggested action button.
    pub action: &'static str,
    /// Where the action navigates to, when it navigates at all.
    pub action_url: Option<&'static str>,
    /// Raw technical details. Always `None` in [`DisplayMode::Production`].
    pub details: Option<String>,
}

impl UserFacingError {
    pub fn from_error(error: &AuthError, mode: DisplayMode) -> Self {
        let (title, action, action_url) = match error.code {
            ErrorKind::Offline => ("Connection Issue", "Try Again", None),
            ErrorKind::SessionExpired => ("Session Expired", "Sign In", Some("/sign-in")),
            ErrorKind::Unauthorized => ("Sign In Required", "Sign In", Some("/sign-in")),
            ErrorKind::Forbidden => ("Access Denied", "Go Back", None),
            ErrorKind::RateLimited => ("Too Many Requests", "Wait and Retry", None),
            _ => ("Something went wrong", "Try Again", None),
        };
        let details = match mode {
            DisplayMode::Development => error.details.clone(),
            DisplayMode::Production => None,
        };
        Self {
            title,
            message: error.message.clone(),
            action,
            action_url,
            details,
        }
    }
}
