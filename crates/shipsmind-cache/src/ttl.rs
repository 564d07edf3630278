//! The single-owner TTL cache.
//!
//! # Concurrency note
//!
//! `TtlCache` is NOT thread-safe by itself; reads take `&mut self` because
//! an expired read removes the entry. Wrap it in [`SharedCache`](crate::SharedCache) to share it between
//! tasks.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::CacheConfig;

/// One memoized value and when it stops being valid.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expiry: Instant,
    /// Insertion sequence number; the key into `TtlCache::order`.
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expiry
    }
}

/// A bounded map with per-entry expiry and insertion-order eviction.
///
/// ```text
/// set("a") set("b") set("c")         order: a b c   (max_size = 3)
/// set("d")                           order: b c d   ← "a" evicted
/// set("b") (overwrite)               order: c d b   ← moves to newest
/// ```
///
/// Eviction order is insertion order, not access order: reading an entry
/// does not protect it from eviction.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys by insertion sequence, oldest first.
    order: BTreeMap<u64, String>,
    next_seq: u64,
    config: CacheConfig,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            config: config.validated(),
        }
    }

    /// Returns the value for `key` if present and not expired.
    ///
    /// An expired entry is removed on the spot (lazy eviction).
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = Instant::now();
        let entry = self.entries.get(key)?;
        if entry.is_expired(now) {
            trace!(key, "cache entry expired on read");
            self.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// `true` if `get` would return a value. Also evicts if expired.
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Stores `value` under the configured TTL.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let ttl = self.config.ttl;
        self.set_with_ttl(key, value, ttl);
    }

    /// Stores `value` for `ttl`, evicting the oldest entry if full.
    ///
    /// Overwriting an existing key counts as a fresh insertion: the entry
    /// gets the new expiry and moves to the newest position.
    pub fn set_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        if self.remove(&key).is_none() && self.entries.len() >= self.config.max_size {
            self.evict_oldest();
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expiry: Instant::now() + ttl,
                seq,
            },
        );
    }

    /// Removes `key`, returning its value if it was present (even if
    /// expired).
    pub fn invalidate(&mut self, key: &str) -> Option<V> {
        self.remove(key)
    }

    /// Removes every key starting with `prefix`. Returns how many.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    /// Removes every expired entry. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of stored entries, expired-but-unswept ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn remove(&mut self, key: &str) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        Some(entry.value)
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.order.pop_first() {
            trace!(key = %key, "cache full, evicting oldest entry");
            self.entries.remove(&key);
        }
    }
}
