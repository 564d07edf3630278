//! A `TtlCache` shareable across tasks.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::{CacheConfig, Sweep, TtlCache};

/// A named [`TtlCache`] behind its own mutex.
///
/// Each instance has its own lock, so the preference cache and the route
/// cache never contend. The lock is only held for the duration of one
/// map operation and never across an `.await`.
#[derive(Debug)]
pub struct SharedCache<V> {
    name: &'static str,
    inner: Mutex<TtlCache<V>>,
}

impl<V: Clone> SharedCache<V> {
    pub fn new(name: &'static str, config: CacheConfig) -> Self {
        Self {
            name,
            inner: Mutex::new(TtlCache::new(config)),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.lock().has(key)
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.lock().set(key, value);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.lock().set_with_ttl(key, value, ttl);
    }

    pub fn invalidate(&self, key: &str) -> Option<V> {
        self.lock().invalidate(key)
    }

    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.lock().invalidate_prefix(prefix)
    }

    pub fn clear(&self) {
        self.lock().clear();
        debug!(cache = self.name, "cache cleared");
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> CacheConfig {
        *self.lock().config()
    }

    fn lock(&self) -> MutexGuard<'_, TtlCache<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone + Send + 'static> Sweep for SharedCache<V> {
    fn sweep_expired(&self) -> usize {
        self.lock().sweep()
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
