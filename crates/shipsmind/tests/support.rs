//! Integration tests for `SessionSupport`: caches, retries, verification,
//! and the session timeout wired to cache clearing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shipsmind::prelude::*;
use shipsmind::prefs::{Method, RawResponse};
use shipsmind::retry::ConnectivityFlag;
use shipsmind::session::{SESSION_EXPIRED_ROUTE, SIGN_IN_ROUTE, SessionView};
use shipsmind::{CacheStats, route_key};

// =========================================================================
// Test doubles
// =========================================================================

#[derive(Default)]
struct FakeProvider {
    session: Mutex<Option<SessionInfo>>,
    session_lookups: AtomicUsize,
    sign_outs: AtomicUsize,
    /// When set, `sign_out` never completes.
    hang_sign_out: AtomicBool,
    /// Failures returned by verification calls before they succeed.
    verification_failures: Mutex<VecDeque<Failure>>,
    verification_calls: AtomicUsize,
}

impl FakeProvider {
    fn with_session(id: &str) -> Self {
        let provider = Self::default();
        *provider.session.lock().unwrap() = Some(SessionInfo {
            session_id: id.to_string(),
            user_id: "user_1".into(),
            status: "active".into(),
            last_active_at: None,
            expire_at: None,
        });
        provider
    }

    fn fail_verification(&self, failure: Failure) {
        self.verification_failures.lock().unwrap().push_back(failure);
    }

    fn next_verification(&self) -> Result<(), Failure> {
        self.verification_calls.fetch_add(1, Ordering::SeqCst);
        match self.verification_failures.lock().unwrap().pop_front() {
            Some(f) => Err(f),
            None => Ok(()),
        }
    }
}

impl IdentityProvider for FakeProvider {
    async fn sign_out(&self) -> Result<(), Failure> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.hang_sign_out.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<SessionInfo>, Failure> {
        self.session_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.session.lock().unwrap().clone())
    }

    async fn prepare_verification(&self) -> Result<(), Failure> {
        self.next_verification()
    }

    async fn attempt_verification(&self, _code: &str) -> Result<(), Failure> {
        self.next_verification()
    }
}

#[derive(Default)]
struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

/// Always returns the same stored preferences.
struct StaticPrefsApi;

impl PreferencesApi for StaticPrefsApi {
    async fn send(&self, _method: Method, _body: Option<String>) -> Result<RawResponse, Failure> {
        Ok(RawResponse {
            status: 200,
            body: r#"{"success":true,"data":{"theme":"dark"}}"#.into(),
        })
    }
}

fn support(provider: FakeProvider) -> SessionSupport<FakeProvider> {
    SessionSupport::new(SupportConfig::default(), provider)
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

// =========================================================================
// Route access
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_route_access_is_memoized_for_a_minute() {
    let s = support(FakeProvider::default());
    let counter = AtomicUsize::new(0);
    let checks = &counter;
    let check = move || async move {
        checks.fetch_add(1, Ordering::SeqCst);
        Ok::<_, Failure>(true)
    };

    assert!(s.check_route_access("user_1", "/leads", check).await.unwrap());
    assert!(s.check_route_access("user_1", "/leads", check).await.unwrap());
    assert_eq!(checks.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(s.check_route_access("user_1", "/leads", check).await.unwrap());
    assert_eq!(checks.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_route_access_denial_is_cached_but_errors_are_not() {
    let s = support(FakeProvider::default());

    let err = s
        .check_route_access("user_1", "/admin", || async { Err(Failure::status(403)) })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorKind::Forbidden);
    assert!(!s.caches().route_access.has(&route_key("user_1", "/admin")));

    let allowed = s
        .check_route_access("user_1", "/admin", || async { Ok(false) })
        .await
        .unwrap();
    assert!(!allowed);
    assert_eq!(s.caches().route_access.get(&route_key("user_1", "/admin")), Some(false));
}

// =========================================================================
// Session info
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_session_info_cached_for_thirty_seconds() {
    let s = support(FakeProvider::with_session("sess_1"));

    let info = s.session_info("sess_1").await.unwrap().unwrap();
    assert_eq!(info.user_id, "user_1");
    s.session_info("sess_1").await.unwrap();
    assert_eq!(s.provider().session_lookups.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(30)).await;
    s.session_info("sess_1").await.unwrap();
    assert_eq!(s.provider().session_lookups.load(Ordering::SeqCst), 2);

    s.refresh_session_info("sess_1").await.unwrap();
    assert_eq!(s.provider().session_lookups.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_session_info_for_other_session_is_none() {
    let s = support(FakeProvider::with_session("sess_2"));

    assert_eq!(s.session_info("sess_1").await.unwrap(), None);
    assert_eq!(s.cache_stats().session_info, 0);
}

// =========================================================================
// Retry and verification
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_prepare_verification_retries_network_failures() {
    let provider = FakeProvider::default();
    provider.fail_verification(Failure::Network("fetch failed".into()));
    let s = support(provider);

    s.prepare_email_verification().await.unwrap();

    assert_eq!(s.provider().verification_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_bad_verification_code_uses_provider_message() {
    let provider = FakeProvider::default();
    provider.fail_verification(Failure::provider("verification_invalid"));
    let s = support(provider);

    let err = s.attempt_email_verification("000000").await.unwrap_err();

    assert_eq!(err.code, ErrorKind::IdentityProvider);
    assert_eq!(
        err.message,
        "Invalid verification code. Please check the code and try again."
    );
    assert_eq!(err.context.as_deref(), Some("verification:attempt"));
    assert_eq!(s.provider().verification_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_offline_device_fails_fast() {
    let online = ConnectivityFlag::new(true);
    let s = SessionSupport::with_connectivity(
        SupportConfig::default(),
        FakeProvider::default(),
        online.clone(),
    );
    online.set_online(false);
    let counter = AtomicUsize::new(0);
    let calls = &counter;

    let err = s
        .run_with_retry("prefs", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Failure::Network("fetch failed".into()))
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorKind::Offline);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(s.user_facing(&err).title, "Connection Issue");
}

// =========================================================================
// Caches and sign-out
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_preferences_share_the_support_cache() {
    let s = support(FakeProvider::default());
    let prefs = s.preferences(StaticPrefsApi);

    assert_eq!(prefs.load("user_1").await.unwrap().theme, Theme::Dark);
    assert_eq!(s.cache_stats().preferences, 1);

    s.clear_user("user_1");
    assert!(prefs.cached("user_1").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_clears_every_cache() {
    let s = support(FakeProvider::with_session("sess_1"));
    s.session_info("sess_1").await.unwrap();
    s.check_route_access("user_1", "/leads", || async { Ok(true) })
        .await
        .unwrap();

    s.sign_out().await.unwrap();

    assert_eq!(
        s.cache_stats(),
        CacheStats {
            preferences: 0,
            session_info: 0,
            route_access: 0,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_purges_expired_session_info() {
    let s = support(FakeProvider::with_session("sess_1"));
    let _sweeper = s.spawn_sweeper();
    s.session_info("sess_1").await.unwrap();

    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;

    assert_eq!(s.caches().session_info.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_session_expiry_signs_out_and_clears_caches() {
    let s = support(FakeProvider::with_session("sess_1"));
    let navigator = Arc::new(RecordingNavigator::default());
    let hub = ActivityHub::default();
    s.check_route_access("user_1", "/leads", || async { Ok(true) })
        .await
        .unwrap();

    let timeout = s.start_session_timeout(Arc::clone(&navigator), &hub);
    tokio::time::sleep(Duration::from_secs(30 * 60)).await;
    settle().await;

    assert_eq!(timeout.view(), SessionView::Expired);
    assert_eq!(s.provider().sign_outs.load(Ordering::SeqCst), 1);
    assert_eq!(s.cache_stats().route_access, 0);
    assert_eq!(
        *navigator.routes.lock().unwrap(),
        vec![SESSION_EXPIRED_ROUTE.to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_session_expiry_clears_caches_when_sign_out_hangs() {
    let provider = FakeProvider::with_session("sess_1");
    provider.hang_sign_out.store(true, Ordering::SeqCst);
    let s = support(provider);
    let navigator = Arc::new(RecordingNavigator::default());
    let hub = ActivityHub::default();
    s.check_route_access("user_1", "/leads", || async { Ok(true) })
        .await
        .unwrap();
    s.session_info("sess_1").await.unwrap();
    assert_eq!(s.cache_stats().session_info, 1);

    let timeout = s.start_session_timeout(Arc::clone(&navigator), &hub);
    // Expiry at 30 minutes, then the 10s sign-out limit.
    tokio::time::sleep(Duration::from_secs(30 * 60 + 11)).await;
    settle().await;

    assert_eq!(timeout.view(), SessionView::Expired);
    assert_eq!(
        s.cache_stats(),
        CacheStats {
            preferences: 0,
            session_info: 0,
            route_access: 0,
        }
    );
    assert_eq!(
        *navigator.routes.lock().unwrap(),
        vec![SIGN_IN_ROUTE.to_string()]
    );
}
