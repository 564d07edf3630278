//! Session timeout actor: an isolated Tokio task that owns one
//! [`SessionClock`].
//!
//! The actor is the only thing that touches the clock. Handles talk to
//! it through an mpsc channel, and it publishes what the UI should show
//! on a watch channel:
//!
//! ```text
//! SessionTimeoutHandle ──Command──→ actor ──SessionView──→ watch subscribers
//! ActivityMonitor ─────Activity───→  │
//!                                    ├ sleep_until(next deadline) → tick
//!                                    └ on expiry: sign_out + redirect (once)
//! ```

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until, timeout};
use tracing::{debug, info, warn};

use crate::{
    ActivityHub, ActivityKind, ActivityMonitor, IdentityProvider, Navigator, SESSION_EXPIRED_ROUTE,
    SIGN_IN_ROUTE, SessionClock, SessionConfig, SessionError, SessionState, Transition,
    format_countdown,
};

/// Command channel depth. Activity is already throttled, so this only
/// needs headroom for a few user actions.
const COMMAND_BUFFER: usize = 16;

/// What the session UI should currently render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum SessionView {
    /// Nothing to show.
    Hidden,
    /// The "session expiring" prompt with a live countdown.
    Warning { remaining_secs: u64 },
    /// The session is over and the user is being sent to sign in.
    Expired,
}

impl SessionView {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }

    /// The countdown text, `m:ss`, while warning.
    pub fn countdown(&self) -> Option<String> {
        match self {
            Self::Warning { remaining_secs } => Some(format_countdown(*remaining_secs)),
            _ => None,
        }
    }
}

impl From<SessionState> for SessionView {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Active => Self::Hidden,
            SessionState::Warning { remaining_secs } => Self::Warning { remaining_secs },
            SessionState::Expired => Self::Expired,
        }
    }
}

/// Commands sent to the timeout actor through its channel.
enum TimeoutCommand {
    /// Throttled activity from the monitor or the host.
    Activity,
    /// "Stay signed in".
    Extend {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    /// "Sign out now" from the warning prompt.
    SignOutNow {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    /// Stop without signing out (component unmounted).
    Shutdown,
}

/// Handle to a running session timeout.
///
/// Cheap to clone. When every handle is dropped the actor stops, detaching
/// its activity monitor.
#[derive(Debug, Clone)]
pub struct SessionTimeoutHandle {
    session_id: String,
    sender: mpsc::Sender<TimeoutCommand>,
    view: watch::Receiver<SessionView>,
}

impl SessionTimeoutHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The most recently published view.
    pub fn view(&self) -> SessionView {
        *self.view.borrow()
    }

    /// A receiver that is notified every time the view changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Keeps the session alive: back to Active with the full duration.
    ///
    /// Fails with [`SessionError::Expired`] once the session is over.
    pub async fn extend(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(TimeoutCommand::Extend { reply }, rx).await
    }

    /// Ends the session now, from Active or Warning.
    pub async fn sign_out_now(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(TimeoutCommand::SignOutNow { reply }, rx).await
    }

    /// Reports activity that didn't come through the hub. Not throttled
    /// here; callers should throttle their own signals. Dropped silently if
    /// the actor is busy or gone.
    pub fn record_activity(&self) {
        let _ = self.sender.try_send(TimeoutCommand::Activity);
    }

    /// Stops the timeout without signing out.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(TimeoutCommand::Shutdown)
            .await
            .map_err(|_| self.gone())
    }

    /// Whether the actor is still running.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    async fn request(
        &self,
        cmd: TimeoutCommand,
        rx: oneshot::Receiver<Result<(), SessionError>>,
    ) -> Result<(), SessionError> {
        self.sender.send(cmd).await.map_err(|_| self.gone())?;
        rx.await.map_err(|_| self.gone())?
    }

    /// The error for a stopped actor: `Expired` if that's why it stopped.
    fn gone(&self) -> SessionError {
        if self.view().is_expired() {
            SessionError::Expired(self.session_id.clone())
        } else {
            SessionError::Unavailable(self.session_id.clone())
        }
    }
}

/// Starts a session timeout for a freshly signed-in user.
///
/// Spawns the actor and attaches an [`ActivityMonitor`] to `hub` that
/// watches every [`ActivityKind`]. Must be called from inside a Tokio
/// runtime.
pub fn spawn_session_timeout<P, N>(
    config: SessionConfig,
    provider: P,
    navigator: N,
    hub: &ActivityHub,
) -> SessionTimeoutHandle
where
    P: IdentityProvider,
    N: Navigator,
{
    let clock = SessionClock::start(config, Instant::now());
    spawn_with_clock(clock, provider, navigator, hub)
}

/// Same as [`spawn_session_timeout`] for a clock the caller built, e.g.
/// one with a known session id.
pub fn spawn_with_clock<P, N>(
    clock: SessionClock,
    provider: P,
    navigator: N,
    hub: &ActivityHub,
) -> SessionTimeoutHandle
where
    P: IdentityProvider,
    N: Navigator,
{
    let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
    let (view_tx, view_rx) = watch::channel(SessionView::from(clock.state()));
    let session_id = clock.id().to_string();

    // The monitor only holds a weak sender, so dropping every handle still
    // closes the channel.
    let weak = sender.downgrade();
    let mut monitor = ActivityMonitor::new(hub, clock.config().activity_throttle());
    monitor.attach(&ActivityKind::ALL, move || {
        if let Some(sender) = weak.upgrade() {
            let _ = sender.try_send(TimeoutCommand::Activity);
        }
    });

    let actor = TimeoutActor {
        sign_out_timeout: clock.config().sign_out_timeout(),
        clock,
        provider,
        navigator,
        monitor,
        receiver,
        view: view_tx,
        signed_out: false,
    };
    tokio::spawn(actor.run());

    SessionTimeoutHandle {
        session_id,
        sender,
        view: view_rx,
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct TimeoutActor<P, N> {
    clock: SessionClock,
    provider: P,
    navigator: N,
    monitor: ActivityMonitor,
    receiver: mpsc::Receiver<TimeoutCommand>,
    view: watch::Sender<SessionView>,
    sign_out_timeout: Duration,
    /// Set before the sign-out call so it can never run twice.
    signed_out: bool,
}

impl<P: IdentityProvider, N: Navigator> TimeoutActor<P, N> {
    /// Runs until the session expires, a shutdown arrives, or every handle
    /// is dropped.
    async fn run(mut self) {
        info!(session_id = %self.clock.id(), "session timeout started");

        loop {
            let deadline = self.clock.next_deadline();
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(TimeoutCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd).await,
                },
                () = sleep_until_deadline(deadline) => {
                    let transitions = self.clock.tick(Instant::now());
                    self.apply(transitions).await;
                }
            }

            if self.clock.state().is_terminal() {
                break;
            }
        }

        self.monitor.detach();
        info!(
            session_id = %self.clock.id(),
            state = %self.clock.state(),
            "session timeout stopped"
        );
    }

    async fn handle(&mut self, cmd: TimeoutCommand) {
        // Catch up first: a deadline may have passed while the command
        // waited in the channel.
        let now = Instant::now();
        let pending = self.clock.tick(now);
        self.apply(pending).await;

        match cmd {
            TimeoutCommand::Activity => {
                if let Some(t) = self.clock.record_activity(now) {
                    self.apply(vec![t]).await;
                }
            }
            TimeoutCommand::Extend { reply } => {
                let result = self.clock.extend(now).map(|t| vec![t]);
                let outcome = match result {
                    Ok(transitions) => {
                        self.apply(transitions).await;
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(outcome);
            }
            TimeoutCommand::SignOutNow { reply } => {
                let outcome = match self.clock.terminate() {
                    Some(t) => {
                        self.apply(vec![t]).await;
                        Ok(())
                    }
                    None => Err(SessionError::Expired(self.clock.id().to_string())),
                };
                let _ = reply.send(outcome);
            }
            TimeoutCommand::Shutdown => {}
        }
    }

    async fn apply(&mut self, transitions: Vec<Transition>) {
        for transition in transitions {
            debug!(session_id = %self.clock.id(), ?transition, "session transition");
            self.publish();
            if let Transition::Expired { .. } = transition {
                self.force_sign_out().await;
            }
        }
    }

    fn publish(&self) {
        let view = SessionView::from(self.clock.state());
        self.view.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }

    /// Signs out with the provider and redirects. Runs at most once.
    ///
    /// The session is over client-side regardless of the outcome; a
    /// failed or hung sign-out only changes where the user lands.
    async fn force_sign_out(&mut self) {
        if self.signed_out {
            return;
        }
        self.signed_out = true;
        self.monitor.detach();

        let session_id = self.clock.id();
        match timeout(self.sign_out_timeout, self.provider.sign_out()).await {
            Ok(Ok(())) => {
                info!(%session_id, "signed out after session expiry");
                self.navigator.redirect(SESSION_EXPIRED_ROUTE);
            }
            Ok(Err(failure)) => {
                warn!(%session_id, error = %failure, "sign-out failed, redirecting to sign-in");
                self.navigator.redirect(SIGN_IN_ROUTE);
            }
            Err(_) => {
                warn!(
                    %session_id,
                    timeout_ms = self.sign_out_timeout.as_millis() as u64,
                    "sign-out timed out, redirecting to sign-in"
                );
                self.navigator.redirect(SIGN_IN_ROUTE);
            }
        }
    }
}

/// Sleeps until `deadline`, or forever if there is none.
async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
