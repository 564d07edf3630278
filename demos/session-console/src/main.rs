//! Terminal driver for a Shipsmind session.
//!
//! Every line typed counts as a key press. A few lines are commands:
//!
//! ```text
//! extend    stay signed in (works during the warning)
//! signout   sign out now
//! stats     print cache sizes and timing stats
//! quit      stop without signing out
//! ```
//!
//! Pass a JSON config path to shorten the timeout, e.g.
//! `{"session": {"session_duration_minutes": 2, "warning_minutes": 1}}`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use shipsmind::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Fake identity provider and navigator
// ---------------------------------------------------------------------------

struct ConsoleProvider {
    signed_in: AtomicBool,
}

impl IdentityProvider for ConsoleProvider {
    async fn sign_out(&self) -> Result<(), Failure> {
        self.signed_in.store(false, Ordering::SeqCst);
        println!("[provider] signed out");
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<SessionInfo>, Failure> {
        if !self.signed_in.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(SessionInfo {
            session_id: "sess_console".into(),
            user_id: "user_console".into(),
            status: "active".into(),
            last_active_at: None,
            expire_at: None,
        }))
    }

    async fn prepare_verification(&self) -> Result<(), Failure> {
        Ok(())
    }

    async fn attempt_verification(&self, code: &str) -> Result<(), Failure> {
        if code == "424242" {
            Ok(())
        } else {
            Err(Failure::provider("verification_invalid"))
        }
    }
}

struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn redirect(&self, route: &str) {
        println!("[navigator] → {route}");
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Extend,
    SignOut,
    Stats,
    Verify(String),
    Quit,
    /// Anything else is just typing.
    Activity,
}

fn parse_command(line: &str) -> Command {
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (Some("extend"), None) => Command::Extend,
        (Some("signout"), None) => Command::SignOut,
        (Some("stats"), None) => Command::Stats,
        (Some("verify"), Some(code)) => Command::Verify(code.to_string()),
        (Some("quit"), None) => Command::Quit,
        _ => Command::Activity,
    }
}

fn render(view: SessionView) -> Option<String> {
    match view {
        SessionView::Hidden => None,
        SessionView::Warning { .. } => Some(format!(
            "Session expiring in {} (type `extend` to stay signed in)",
            view.countdown().unwrap_or_default()
        )),
        SessionView::Expired => Some("Session expired.".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match std::env::args().nth(1) {
        Some(path) => SupportConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => SupportConfig::default(),
    };

    let support = SessionSupport::new(
        config,
        ConsoleProvider {
            signed_in: AtomicBool::new(true),
        },
    );
    let hub = ActivityHub::default();
    let timeout = support.start_session_timeout(Arc::new(ConsoleNavigator), &hub);
    let _sweeper = support.spawn_sweeper();
    info!(session_id = timeout.session_id(), "session started");

    // Print the countdown whenever the view changes.
    let mut views = timeout.subscribe();
    tokio::spawn(async move {
        while views.changed().await.is_ok() {
            if let Some(line) = render(*views.borrow_and_update()) {
                println!("{line}");
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Activity => {
                hub.emit(ActivityKind::KeyPress);
            }
            Command::Extend => match timeout.extend().await {
                Ok(()) => println!("Session extended."),
                Err(e) => println!("{e}"),
            },
            Command::SignOut => {
                let _ = timeout.sign_out_now().await;
            }
            Command::Stats => {
                println!("{:?}", support.cache_stats());
                for (op, stats) in support.monitor().all_stats() {
                    println!("{op}: {stats:?}");
                }
            }
            Command::Verify(code) => match support.attempt_email_verification(&code).await {
                Ok(()) => println!("Email verified."),
                Err(e) => println!("{}", support.user_facing(&e).message),
            },
            Command::Quit => {
                let _ = timeout.shutdown().await;
                break;
            }
        }

        if timeout.view().is_expired() {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("extend"), Command::Extend);
        assert_eq!(parse_command("  signout "), Command::SignOut);
        assert_eq!(parse_command("verify 123456"), Command::Verify("123456".into()));
        assert_eq!(parse_command("verify"), Command::Activity);
        assert_eq!(parse_command("hello there"), Command::Activity);
        assert_eq!(parse_command(""), Command::Activity);
    }

    #[test]
    fn test_render() {
        assert_eq!(render(SessionView::Hidden), None);
        assert_eq!(
            render(SessionView::Warning { remaining_secs: 65 }).as_deref(),
            Some("Session expiring in 1:05 (type `extend` to stay signed in)")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_code_shows_provider_message() {
        let support = SessionSupport::new(
            SupportConfig::default(),
            ConsoleProvider {
                signed_in: AtomicBool::new(true),
            },
        );
        let err = support.attempt_email_verification("000000").await.unwrap_err();
        assert_eq!(
            support.user_facing(&err).message,
            "Invalid verification code. Please check the code and try again."
        );
    }
}
