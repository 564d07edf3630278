//! `SessionSupport`: the context object every session-aware part of the
//! host shares.
//!
//! It owns the caches, the retry runner, and the performance monitor, and
//! hands out the pieces built on them (preferences service, session
//! timeout, cache sweeper). Nothing here is global; two contexts never
//! share state.

use std::future::Future;
use std::sync::Arc;

use shipsmind_cache::{SweeperHandle, spawn_sweeper};
use shipsmind_prefs::{PreferencesApi, PreferencesClient, PreferencesService};
use shipsmind_retry::{
    AlwaysOnline, AuthError, Classifier, Connectivity, Failure, RetryRunner, UserFacingError,
};
use shipsmind_session::{
    ActivityHub, IdentityProvider, Navigator, SessionInfo, SessionTimeoutHandle,
    spawn_session_timeout,
};
use shipsmind_timing::PerformanceMonitor;
use tracing::{debug, info, warn};

use crate::caches::{CacheStats, SupportCaches, route_key, session_key};
use crate::SupportConfig;

/// Retry context for session lookups.
pub const SESSION_CONTEXT: &str = "session:refresh";
/// Retry context for route-access checks.
pub const ROUTE_CONTEXT: &str = "route:access";
/// Retry context for sending a verification code.
pub const VERIFY_PREPARE_CONTEXT: &str = "verification:prepare";
/// Retry context for submitting a verification code.
pub const VERIFY_ATTEMPT_CONTEXT: &str = "verification:attempt";

/// Shared session support for one signed-in host.
#[derive(Debug)]
pub struct SessionSupport<P> {
    config: SupportConfig,
    provider: Arc<P>,
    caches: SupportCaches,
    retry: Arc<RetryRunner>,
    monitor: Arc<PerformanceMonitor>,
}

impl<P: IdentityProvider> SessionSupport<P> {
    /// A context that assumes the device is always online.
    pub fn new(config: SupportConfig, provider: P) -> Self {
        Self::with_connectivity(config, provider, AlwaysOnline)
    }

    /// A context whose classifier consults `connectivity` first.
    pub fn with_connectivity(
        config: SupportConfig,
        provider: P,
        connectivity: impl Connectivity,
    ) -> Self {
        let config = config.validated();
        let retry = RetryRunner::new(config.retry.to_policy(), Classifier::new(connectivity));
        Self {
            caches: SupportCaches::new(&config),
            provider: Arc::new(provider),
            retry: Arc::new(retry),
            monitor: Arc::new(PerformanceMonitor::new()),
            config,
        }
    }

    // ---- Retry ----

    /// Runs a session-dependent call with classification and backoff.
    pub async fn run_with_retry<T, F, Fut>(&self, context: &str, operation: F) -> Result<T, AuthError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.retry.run(context, operation).await
    }

    /// The error view for `error` under the configured display mode.
    pub fn user_facing(&self, error: &AuthError) -> UserFacingError {
        error.to_user_facing(self.config.display_mode)
    }

    // ---- Session info ----

    /// Metadata for `session_id`, cached for the session-cache TTL.
    ///
    /// `Ok(None)` when the provider has no session, or a different one
    /// (the user signed in again elsewhere).
    pub async fn session_info(&self, session_id: &str) -> Result<Option<SessionInfo>, AuthError> {
        let key = session_key(session_id);
        if let Some(info) = self.caches.session_info.get(&key) {
            return Ok(Some(info));
        }

        let timing = self.monitor.start_timing(PerformanceMonitor::SESSION_VALIDATION);
        let provider = &self.provider;
        let current = self
            .retry
            .run(SESSION_CONTEXT, move || provider.current_session())
            .await?;
        timing.finish();

        match current {
            Some(info) if info.session_id == session_id => {
                self.caches.session_info.set(key, info.clone());
                Ok(Some(info))
            }
            Some(other) => {
                debug!(%session_id, current = %other.session_id, "provider reports a different session");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Like [`session_info`](Self::session_info) but always asks the
    /// provider.
    pub async fn refresh_session_info(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionInfo>, AuthError> {
        self.caches.session_info.invalidate(&session_key(session_id));
        self.session_info(session_id).await
    }

    // ---- Route access ----

    /// Whether `user_id` may open `route`, memoized for the route-cache
    /// TTL. `check` runs only on a miss, under retry.
    pub async fn check_route_access<F, Fut>(
        &self,
        user_id: &str,
        route: &str,
        check: F,
    ) -> Result<bool, AuthError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, Failure>>,
    {
        let key = route_key(user_id, route);
        if let Some(allowed) = self.caches.route_access.get(&key) {
            return Ok(allowed);
        }

        let timing = self.monitor.start_timing(PerformanceMonitor::AUTH_CHECK);
        let allowed = self.retry.run(ROUTE_CONTEXT, check).await?;
        timing.finish();

        self.caches.route_access.set(key, allowed);
        debug!(%user_id, route, allowed, "route access decided");
        Ok(allowed)
    }

    // ---- Email verification ----

    /// Sends a verification code to the user's email.
    pub async fn prepare_email_verification(&self) -> Result<(), AuthError> {
        let provider = &self.provider;
        self.retry
            .run(VERIFY_PREPARE_CONTEXT, move || provider.prepare_verification())
            .await
    }

    /// Submits the code the user entered.
    pub async fn attempt_email_verification(&self, code: &str) -> Result<(), AuthError> {
        let provider = &self.provider;
        self.retry
            .run(VERIFY_ATTEMPT_CONTEXT, move || provider.attempt_verification(code))
            .await?;
        info!("email verified");
        Ok(())
    }

    // ---- Preferences ----

    /// A preferences service sharing this context's cache, runner, and
    /// monitor.
    pub fn preferences<A: PreferencesApi>(&self, api: A) -> PreferencesService<A> {
        PreferencesService::new(
            PreferencesClient::new(api),
            Arc::clone(&self.caches.preferences),
            Arc::clone(&self.retry),
            Arc::clone(&self.monitor),
        )
    }

    // ---- Session lifecycle ----

    /// Starts the idle timeout for a freshly signed-in user. On expiry
    /// the user is signed out, every cache is cleared, and `navigator`
    /// redirects to sign-in.
    pub fn start_session_timeout<N: Navigator>(
        &self,
        navigator: N,
        hub: &ActivityHub,
    ) -> SessionTimeoutHandle {
        let provider = CacheClearingProvider {
            inner: Arc::clone(&self.provider),
            caches: self.caches.clone(),
        };
        spawn_session_timeout(self.config.session.clone(), provider, navigator, hub)
    }

    /// Signs out and clears every cache. The caches are cleared even when
    /// the provider call fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.caches.clear_all();
        let result = self.provider.sign_out().await;
        self.caches.clear_all();
        result.map_err(|failure| {
            warn!(error = %failure, "sign-out failed");
            self.retry.classifier().normalize(Some(&failure), Some("sign_out"))
        })
    }

    /// Purges expired cache entries in the background every
    /// `sweep_interval_secs`. Dropping the handle stops it.
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        spawn_sweeper(self.caches.sweepable(), self.config.sweep_interval())
    }

    // ---- Caches ----

    pub fn caches(&self) -> &SupportCaches {
        &self.caches
    }

    pub fn clear_all(&self) {
        self.caches.clear_all();
    }

    pub fn clear_user(&self, user_id: &str) {
        self.caches.clear_user(user_id);
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.caches.stats()
    }

    // ---- Accessors ----

    pub fn config(&self) -> &SupportConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn retry(&self) -> &Arc<RetryRunner> {
        &self.retry
    }

    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }
}

/// Wraps the host's provider so that a sign-out also clears the caches.
///
/// The caches are cleared before the inner call, since the caller may
/// drop this future on timeout, and again after it in case a lookup
/// refilled them while the call was in flight.
struct CacheClearingProvider<P> {
    inner: Arc<P>,
    caches: SupportCaches,
}

impl<P: IdentityProvider> IdentityProvider for CacheClearingProvider<P> {
    async fn sign_out(&self) -> Result<(), Failure> {
        self.caches.clear_all();
        let result = self.inner.sign_out().await;
        self.caches.clear_all();
        result
    }

    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<SessionInfo>, Failure>> + Send {
        self.inner.current_session()
    }

    fn prepare_verification(&self) -> impl Future<Output = Result<(), Failure>> + Send {
        self.inner.prepare_verification()
    }

    fn attempt_verification(&self, code: &str) -> impl Future<Output = Result<(), Failure>> + Send {
        self.inner.attempt_verification(code)
    }
}
