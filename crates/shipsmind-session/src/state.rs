//! Session states and the transition table.

use serde::Serialize;

/// The current state of a session's timeout clock.
///
/// A forward-only state machine with one way back:
///
/// ```text
///   Active ──(warning due)──→ Warning ──(countdown hits 0)──→ Expired
///     ↑  ↺ (activity/extend)    │
///     └────────(extend)─────────┘
/// ```
///
/// - **Active**: normal use. Qualifying activity resets the clock.
/// - **Warning**: the countdown is visible. Only an explicit extend
///   resets; activity alone does not.
/// - **Expired**: terminal for this clock. A new session needs a new
///   [`SessionClock`](crate::SessionClock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Active,
    /// Seconds left until expiry, rounded up.
    Warning { remaining_secs: u64 },
    Expired,
}

impl SessionState {
    /// The state without its countdown payload.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Active => Phase::Active,
            Self::Warning { .. } => Phase::Warning,
            Self::Expired => Phase::Expired,
        }
    }

    /// `true` once expired.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired)
    }

    /// The countdown value; only meaningful in `Warning`.
    pub fn remaining_secs(&self) -> Option<u64> {
        match self {
            Self::Warning { remaining_secs } => Some(*remaining_secs),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Warning { remaining_secs } => write!(f, "warning ({remaining_secs}s left)"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// [`SessionState`] without payload, used as the key of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Active,
    Warning,
    Expired,
}

/// Everything that can drive the session clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// Idle time reached the warning point.
    WarningDue,
    /// The warning countdown reached zero.
    CountdownElapsed,
    /// Throttled user activity.
    Activity,
    /// The user confirmed they want to stay signed in.
    Extend,
    /// The user chose to sign out from the warning.
    SignOut,
}

impl Phase {
    /// The transition table. `None` means the event is ignored in this
    /// phase.
    pub fn on(self, event: SessionEvent) -> Option<Phase> {
        use SessionEvent as E;
        match (self, event) {
            (Phase::Active, E::WarningDue) => Some(Phase::Warning),
            (Phase::Active, E::Activity | E::Extend) => Some(Phase::Active),
            (Phase::Warning, E::Extend) => Some(Phase::Active),
            (Phase::Warning, E::CountdownElapsed) => Some(Phase::Expired),
            (Phase::Active | Phase::Warning, E::SignOut) => Some(Phase::Expired),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: [SessionEvent; 5] = [
        SessionEvent::WarningDue,
        SessionEvent::CountdownElapsed,
        SessionEvent::Activity,
        SessionEvent::Extend,
        SessionEvent::SignOut,
    ];

    #[test]
    fn test_expired_ignores_every_event() {
        for e in EVENTS {
            assert_eq!(Phase::Expired.on(e), None, "{e:?}");
        }
    }

    #[test]
    fn test_activity_only_resets_active() {
        assert_eq!(Phase::Active.on(SessionEvent::Activity), Some(Phase::Active));
        assert_eq!(Phase::Warning.on(SessionEvent::Activity), None);
    }

    #[test]
    fn test_active_cannot_jump_to_expired_on_timeout() {
        assert_eq!(Phase::Active.on(SessionEvent::CountdownElapsed), None);
    }

    #[test]
    fn test_extend_from_warning_goes_active() {
        assert_eq!(Phase::Warning.on(SessionEvent::Extend), Some(Phase::Active));
    }

    #[test]
    fn test_sign_out_expires_from_live_phases() {
        assert_eq!(Phase::Active.on(SessionEvent::SignOut), Some(Phase::Expired));
        assert_eq!(Phase::Warning.on(SessionEvent::SignOut), Some(Phase::Expired));
    }

    #[test]
    fn test_state_accessors() {
        let w = SessionState::Warning { remaining_secs: 42 };
        assert_eq!(w.phase(), Phase::Warning);
        assert_eq!(w.remaining_secs(), Some(42));
        assert_eq!(SessionState::Active.remaining_secs(), None);
        assert!(SessionState::Expired.is_terminal());
        assert_eq!(w.to_string(), "warning (42s left)");
    }
}
