//! Cached, retried access to a user's preferences.

use std::sync::Arc;

use chrono::Utc;
use shipsmind_cache::{CacheConfig, SharedCache};
use shipsmind_retry::{AuthError, RetryRunner};
use shipsmind_timing::PerformanceMonitor;
use tracing::{debug, info};

use crate::{Preferences, PreferencesApi, PreferencesClient, PreferencesUpdate};

/// Retry context for loads.
pub const LOAD_CONTEXT: &str = "preferences:load";
/// Retry context for updates.
pub const UPDATE_CONTEXT: &str = "preferences:update";

/// Cache key for a user's preferences.
pub fn cache_key(user_id: &str) -> String {
    format!("prefs:{user_id}")
}

/// Preferences with a cache in front and retries behind.
///
/// - Reads are cache-first; a miss goes to the store (which creates
///   defaults for a new user) and fills the cache.
/// - Writes go to the store and then overwrite the cached record with
///   what the store returned.
///
/// The cache, runner, and monitor are shared with the rest of the
/// session support context, so a sign-out clearing caches also clears
/// these entries.
#[derive(Debug)]
pub struct PreferencesService<A> {
    client: PreferencesClient<A>,
    cache: Arc<SharedCache<Preferences>>,
    retry: Arc<RetryRunner>,
    monitor: Arc<PerformanceMonitor>,
}

impl<A: PreferencesApi> PreferencesService<A> {
    pub fn new(
        client: PreferencesClient<A>,
        cache: Arc<SharedCache<Preferences>>,
        retry: Arc<RetryRunner>,
        monitor: Arc<PerformanceMonitor>,
    ) -> Self {
        Self {
            client,
            cache,
            retry,
            monitor,
        }
    }

    /// A service with its own cache, runner, and monitor.
    pub fn standalone(api: A) -> Self {
        Self::new(
            PreferencesClient::new(api),
            Arc::new(SharedCache::new("preferences", CacheConfig::preferences())),
            Arc::new(RetryRunner::default()),
            Arc::new(PerformanceMonitor::new()),
        )
    }

    /// Returns the user's preferences, from cache when fresh.
    pub async fn load(&self, user_id: &str) -> Result<Preferences, AuthError> {
        let timing = self.monitor.start_timing(PerformanceMonitor::PREFERENCES_LOAD);
        let key = cache_key(user_id);

        if let Some(prefs) = self.cache.get(&key) {
            debug!(%user_id, "preferences cache hit");
            timing.finish();
            return Ok(prefs);
        }

        let client = &self.client;
        let prefs = self.retry.run(LOAD_CONTEXT, move || client.fetch()).await?;
        self.cache.set(key, prefs.clone());
        debug!(%user_id, "preferences loaded from store");
        timing.finish();
        Ok(prefs)
    }

    /// Saves a partial update and caches the result.
    pub async fn update(
        &self,
        user_id: &str,
        update: PreferencesUpdate,
    ) -> Result<Preferences, AuthError> {
        let client = &self.client;
        let update = &update;
        let prefs = self
            .retry
            .run(UPDATE_CONTEXT, move || client.update(update))
            .await?;
        self.cache.set(cache_key(user_id), prefs.clone());
        info!(%user_id, "preferences updated");
        Ok(prefs)
    }

    /// Records that the user has seen the email verification prompt.
    pub async fn mark_verification_prompted(
        &self,
        user_id: &str,
    ) -> Result<Preferences, AuthError> {
        self.update(user_id, PreferencesUpdate::default().verification_prompted(true))
            .await
    }

    /// Stamps the last-login reminder with the current time.
    pub async fn touch_last_login_reminder(
        &self,
        user_id: &str,
    ) -> Result<Preferences, AuthError> {
        self.update(user_id, PreferencesUpdate::default().last_login_reminder(Utc::now()))
            .await
    }

    /// Warms the cache right after sign-in. Failures are logged and
    /// otherwise ignored; the next `load` tries again.
    pub async fn preload(&self, user_id: &str) {
        if let Err(e) = self.load(user_id).await {
            debug!(%user_id, error = %e, "preferences preload failed");
        }
    }

    /// Drops the cached record so the next `load` hits the store.
    pub fn invalidate(&self, user_id: &str) {
        self.cache.invalidate(&cache_key(user_id));
    }

    /// The cached record, if fresh. Never touches the store.
    pub fn cached(&self, user_id: &str) -> Option<Preferences> {
        self.cache.get(&cache_key(user_id))
    }

    pub fn cache(&self) -> &Arc<SharedCache<Preferences>> {
        &self.cache
    }
}
