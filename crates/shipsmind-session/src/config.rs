//! Session timeout configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Timing knobs for one signed-in session.
///
/// Defaults: a 30-minute session with a 5-minute warning, and
/// activity counted at most once every 30 seconds.
///
/// ```text
/// 0 ─────────────── 25 min ──────────── 30 min
///   Active           Warning (countdown)  Expired
///                    └ warning_minutes ──┘
/// └──────────── session_duration_minutes ──┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long before expiry the warning appears. Default: 5.
    pub warning_minutes: u64,

    /// Idle time after which the session expires. Default: 30.
    pub session_duration_minutes: u64,

    /// Activity throttle window in seconds. Default: 30.
    pub activity_throttle_secs: u64,

    /// Upper bound on the forced sign-out call in seconds. The session is
    /// terminated client-side whether or not the call finishes. Default: 10.
    pub sign_out_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            warning_minutes: 5,
            session_duration_minutes: 30,
            activity_throttle_secs: 30,
            sign_out_timeout_secs: 10,
        }
    }
}

impl SessionConfig {
    /// Longest allowed `session_duration_minutes`: one week.
    pub const MAX_SESSION_MINUTES: u64 = 7 * 24 * 60;

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// - `session_duration_minutes` is between 1 and
    ///   [`MAX_SESSION_MINUTES`](Self::MAX_SESSION_MINUTES).
    /// - `warning_minutes` is at most `session_duration_minutes`.
    /// - `sign_out_timeout_secs` is at least 1.
    pub fn validated(mut self) -> Self {
        if self.session_duration_minutes == 0 {
            warn!("session_duration_minutes of 0, using 1");
            self.session_duration_minutes = 1;
        }
        if self.session_duration_minutes > Self::MAX_SESSION_MINUTES {
            warn!(
                duration = self.session_duration_minutes,
                cap = Self::MAX_SESSION_MINUTES,
                "session_duration_minutes exceeds cap, clamping"
            );
            self.session_duration_minutes = Self::MAX_SESSION_MINUTES;
        }
        if self.warning_minutes > self.session_duration_minutes {
            warn!(
                warning = self.warning_minutes,
                duration = self.session_duration_minutes,
                "warning longer than session, clamping"
            );
            self.warning_minutes = self.session_duration_minutes;
        }
        if self.sign_out_timeout_secs == 0 {
            self.sign_out_timeout_secs = 1;
        }
        self
    }

    /// Full idle time before expiry.
    pub fn total_duration(&self) -> Duration {
        Duration::from_secs(self.session_duration_minutes.saturating_mul(60))
    }

    /// Length of the warning countdown.
    pub fn warning_threshold(&self) -> Duration {
        Duration::from_secs(self.warning_minutes.saturating_mul(60))
    }

    /// Idle time after which the warning appears.
    pub fn warning_after(&self) -> Duration {
        self.total_duration()
            .saturating_sub(self.warning_threshold())
    }

    pub fn activity_throttle(&self) -> Duration {
        Duration::from_secs(self.activity_throttle_secs)
    }

    pub fn sign_out_timeout(&self) -> Duration {
        Duration::from_secs(self.sign_out_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SessionConfig::default();
        assert_eq!(c.warning_minutes, 5);
        assert_eq!(c.session_duration_minutes, 30);
        assert_eq!(c.total_duration(), Duration::from_secs(1800));
        assert_eq!(c.warning_after(), Duration::from_secs(1500));
        assert_eq!(c.activity_throttle(), Duration::from_secs(30));
    }

    #[test]
    fn test_validated_clamps_warning_to_duration() {
        let c = SessionConfig {
            warning_minutes: 45,
            session_duration_minutes: 30,
            ..SessionConfig::default()
        }
        .validated();
        assert_eq!(c.warning_minutes, 30);
        assert_eq!(c.warning_after(), Duration::ZERO);
    }

    #[test]
    fn test_validated_fixes_zero_duration() {
        let c = SessionConfig {
            warning_minutes: 0,
            session_duration_minutes: 0,
            ..SessionConfig::default()
        }
        .validated();
        assert_eq!(c.session_duration_minutes, 1);
    }

    #[test]
    fn test_validated_caps_huge_duration() {
        let c = SessionConfig {
            warning_minutes: u64::MAX,
            session_duration_minutes: u64::MAX,
            ..SessionConfig::default()
        }
        .validated();
        assert_eq!(c.session_duration_minutes, SessionConfig::MAX_SESSION_MINUTES);
        assert_eq!(c.warning_minutes, SessionConfig::MAX_SESSION_MINUTES);
        assert_eq!(c.total_duration(), Duration::from_secs(7 * 24 * 3600));
    }

    #[test]
    fn test_durations_saturate_without_validation() {
        let c = SessionConfig {
            warning_minutes: u64::MAX,
            session_duration_minutes: u64::MAX,
            ..SessionConfig::default()
        };
        assert_eq!(c.total_duration(), Duration::from_secs(u64::MAX));
        assert_eq!(c.warning_after(), Duration::ZERO);
    }
}
