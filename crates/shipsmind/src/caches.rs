//! The three purpose-scoped caches and their keys.

use std::sync::Arc;

use serde::Serialize;
use shipsmind_cache::{SharedCache, Sweep};
use shipsmind_prefs::{Preferences, cache_key as prefs_key};
use shipsmind_session::SessionInfo;
use tracing::debug;

use crate::SupportConfig;

/// Cache key for a session's metadata.
pub fn session_key(session_id: &str) -> String {
    format!("session:{session_id}")
}

/// Cache key for one route-access decision.
///
/// The user id is escaped so no id can be a prefix of another user's keys.
pub fn route_key(user_id: &str, route: &str) -> String {
    format!("{}{route}", route_prefix(user_id))
}

/// Key prefix shared by every route decision for `user_id`.
fn route_prefix(user_id: &str) -> String {
    format!("route:{}:", escape_segment(user_id))
}

/// Percent-escapes `%` and `:` so the segment never contains the separator.
fn escape_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            c => out.push(c),
        }
    }
    out
}

/// Entry counts per cache, for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub preferences: usize,
    pub session_info: usize,
    pub route_access: usize,
}

/// Preferences, session info, and route-access caches.
///
/// Cheap to clone; clones share the same caches.
#[derive(Debug, Clone)]
pub struct SupportCaches {
    pub preferences: Arc<SharedCache<Preferences>>,
    pub session_info: Arc<SharedCache<SessionInfo>>,
    pub route_access: Arc<SharedCache<bool>>,
}

impl SupportCaches {
    pub fn new(config: &SupportConfig) -> Self {
        Self {
            preferences: Arc::new(SharedCache::new("preferences", config.preferences_cache)),
            session_info: Arc::new(SharedCache::new("session_info", config.session_cache)),
            route_access: Arc::new(SharedCache::new("route_access", config.route_cache)),
        }
    }

    /// Empties every cache. Used on sign-out.
    pub fn clear_all(&self) {
        self.preferences.clear();
        self.session_info.clear();
        self.route_access.clear();
    }

    /// Drops one user's preferences and every route decision made for
    /// them. Session info is keyed by session, not user, and stays.
    pub fn clear_user(&self, user_id: &str) {
        self.preferences.invalidate(&prefs_key(user_id));
        let routes = self
            .route_access
            .invalidate_prefix(&route_prefix(user_id));
        debug!(%user_id, routes, "cleared user caches");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            preferences: self.preferences.len(),
            session_info: self.session_info.len(),
            route_access: self.route_access.len(),
        }
    }

    /// The caches as sweep targets.
    pub fn sweepable(&self) -> Vec<Arc<dyn Sweep>> {
        vec![
            Arc::clone(&self.preferences) as Arc<dyn Sweep>,
            Arc::clone(&self.session_info) as Arc<dyn Sweep>,
            Arc::clone(&self.route_access) as Arc<dyn Sweep>,
        ]
    }
}
