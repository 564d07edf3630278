//! Preference records as stored and as edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Color scheme choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the operating system.
    #[default]
    System,
}

/// A user's stored preferences.
///
/// Field names match the store's JSON (`lastLoginReminder`,
/// `verificationPrompted`). Missing fields fall back to the defaults a
/// new user gets; unknown fields (ids, timestamps) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub theme: Theme,
    pub notifications: bool,
    pub last_login_reminder: Option<DateTime<Utc>>,
    pub verification_prompted: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            notifications: true,
            last_login_reminder: None,
            verification_prompted: false,
        }
    }
}

impl Preferences {
    /// Applies every field `update` sets.
    pub fn apply(&mut self, update: &PreferencesUpdate) {
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
        if let Some(notifications) = update.notifications {
            self.notifications = notifications;
        }
        if let Some(at) = update.last_login_reminder {
            self.last_login_reminder = Some(at);
        }
        if let Some(prompted) = update.verification_prompted {
            self.verification_prompted = prompted;
        }
    }

    /// The update that would create this record from scratch.
    pub fn as_update(&self) -> PreferencesUpdate {
        PreferencesUpdate {
            theme: Some(self.theme),
            notifications: Some(self.notifications),
            last_login_reminder: self.last_login_reminder,
            verification_prompted: Some(self.verification_prompted),
        }
    }
}

/// A partial edit. Only the fields that are `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_reminder: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_prompted: Option<bool>,
}

impl PreferencesUpdate {
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn notifications(mut self, on: bool) -> Self {
        self.notifications = Some(on);
        self
    }

    pub fn last_login_reminder(mut self, at: DateTime<Utc>) -> Self {
        self.last_login_reminder = Some(at);
        self
    }

    pub fn verification_prompted(mut self, prompted: bool) -> Self {
        self.verification_prompted = Some(prompted);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Folds a later edit into this one. Fields set in `later` win.
    pub fn merge(&mut self, later: PreferencesUpdate) {
        self.theme = later.theme.or(self.theme);
        self.notifications = later.notifications.or(self.notifications);
        self.last_login_reminder = later.last_login_reminder.or(self.last_login_reminder);
        self.verification_prompted = later.verification_prompted.or(self.verification_prompted);
    }
}
