//! The session timeout clock: the state machine plus its deadlines.
//!
//! [`SessionClock`] holds no timers. Every method takes `now` and the
//! caller decides when to call [`tick`](SessionClock::tick), usually at
//! [`next_deadline`](SessionClock::next_deadline). That keeps the state
//! machine deterministic and lets tests drive it with plain instants.

use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::{SessionConfig, SessionError, SessionEvent, SessionState};

/// One second, the countdown resolution.
const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Something observable that happened to the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Active → Warning. `remaining_secs` is 0 if the warning point was
    /// noticed only after expiry (a suspended host).
    WarningStarted { remaining_secs: u64 },
    /// The countdown moved to a new whole second.
    Countdown { remaining_secs: u64 },
    /// The clock restarted from now.
    Reset { cause: ResetCause },
    /// The session is over. Happens at most once per clock.
    Expired { reason: ExpiryReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCause {
    Activity,
    Extend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// The countdown ran out.
    Timeout,
    /// The user chose to sign out from the warning.
    SignedOut,
}

/// Timeout state for one signed-in session.
///
/// The clock measures idle time from `session_start`, which moves forward
/// on every reset. Warning starts at `session_start + warning_after`,
/// expiry at `session_start + total_duration`.
#[derive(Debug, Clone)]
pub struct SessionClock {
    id: String,
    config: SessionConfig,
    session_start: Instant,
    state: SessionState,
}

impl SessionClock {
    /// Starts a new clock at `now` with a random session id.
    pub fn start(config: SessionConfig, now: Instant) -> Self {
        Self::with_id(generate_session_id(), config, now)
    }

    /// Starts a new clock for a known session id.
    pub fn with_id(id: impl Into<String>, config: SessionConfig, now: Instant) -> Self {
        let clock = Self {
            id: id.into(),
            config: config.validated(),
            session_start: now,
            state: SessionState::Active,
        };
        debug!(session_id = %clock.id, "session clock started");
        clock
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// When the idle time was last reset.
    pub fn session_start(&self) -> Instant {
        self.session_start
    }

    pub fn warning_at(&self) -> Instant {
        self.session_start + self.config.warning_after()
    }

    pub fn expires_at(&self) -> Instant {
        self.session_start + self.config.total_duration()
    }

    /// Whole seconds until expiry at `now`, rounded up.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let left = self.expires_at().saturating_duration_since(now);
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    /// The next instant at which [`tick`](Self::tick) has work to do.
    ///
    /// - Active: the warning point.
    /// - Warning: the next whole-second boundary of the countdown (the
    ///   last one being expiry itself).
    /// - Expired: never.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            SessionState::Active => Some(self.warning_at()),
            SessionState::Warning { remaining_secs } => {
                let steps = remaining_secs.saturating_sub(1);
                let back = COUNTDOWN_STEP * u32::try_from(steps).unwrap_or(u32::MAX);
                Some(
                    self.expires_at()
                        .checked_sub(back)
                        .unwrap_or_else(|| self.expires_at()),
                )
            }
            SessionState::Expired => None,
        }
    }

    /// Advances the clock to `now`, returning every transition that
    /// happened on the way, in order.
    ///
    /// A late tick that lands past expiry while still Active goes through
    /// Warning (with 0 seconds left) and then Expired in the same call.
    pub fn tick(&mut self, now: Instant) -> Vec<Transition> {
        let mut out = Vec::new();

        if self.state == SessionState::Active && now >= self.warning_at() {
            let remaining_secs = self.remaining_secs(now);
            if self.apply(SessionEvent::WarningDue, SessionState::Warning { remaining_secs }) {
                info!(session_id = %self.id, remaining_secs, "session expiry warning");
                out.push(Transition::WarningStarted { remaining_secs });
            }
        }

        if let SessionState::Warning { remaining_secs } = self.state {
            if now >= self.expires_at() {
                if self.apply(SessionEvent::CountdownElapsed, SessionState::Expired) {
                    info!(session_id = %self.id, "session expired");
                    out.push(Transition::Expired {
                        reason: ExpiryReason::Timeout,
                    });
                }
            } else {
                let now_left = self.remaining_secs(now);
                if now_left != remaining_secs {
                    self.state = SessionState::Warning {
                        remaining_secs: now_left,
                    };
                    out.push(Transition::Countdown {
                        remaining_secs: now_left,
                    });
                }
            }
        }

        out
    }

    /// Counts a (throttled) activity signal. Only resets while Active;
    /// in Warning the user must extend explicitly.
    ///
    /// Callers should [`tick`](Self::tick) first so a missed deadline is
    /// not papered over by the reset.
    pub fn record_activity(&mut self, now: Instant) -> Option<Transition> {
        if !self.apply(SessionEvent::Activity, SessionState::Active) {
            trace!(session_id = %self.id, state = %self.state, "activity ignored");
            return None;
        }
        self.session_start = now;
        trace!(session_id = %self.id, "activity reset session clock");
        Some(Transition::Reset {
            cause: ResetCause::Activity,
        })
    }

    /// The user chose to stay signed in. Works from Active or Warning and
    /// restarts the full duration from `now`.
    pub fn extend(&mut self, now: Instant) -> Result<Transition, SessionError> {
        if !self.apply(SessionEvent::Extend, SessionState::Active) {
            return Err(SessionError::Expired(self.id.clone()));
        }
        self.session_start = now;
        info!(session_id = %self.id, "session extended");
        Ok(Transition::Reset {
            cause: ResetCause::Extend,
        })
    }

    /// Ends the session on the user's request. Returns `None` if it had
    /// already expired.
    pub fn terminate(&mut self) -> Option<Transition> {
        if !self.apply(SessionEvent::SignOut, SessionState::Expired) {
            return None;
        }
        info!(session_id = %self.id, "session ended by user");
        Some(Transition::Expired {
            reason: ExpiryReason::SignedOut,
        })
    }

    /// Moves to `next` if the transition table allows `event` from the
    /// current phase.
    fn apply(&mut self, event: SessionEvent, next: SessionState) -> bool {
        match self.state.phase().on(event) {
            Some(phase) if phase == next.phase() => {
                self.state = next;
                true
            }
            Some(_) | None => false,
        }
    }
}

/// Formats a countdown as `m:ss`, e.g. `4:05`.
pub fn format_countdown(remaining_secs: u64) -> String {
    format!("{}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

/// A random session id: `sess_` followed by 32 hex characters.
fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("sess_{hex}")
}

// =========================================================================
// Tests
// =========================================================================
