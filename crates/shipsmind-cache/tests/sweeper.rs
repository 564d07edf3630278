//! Integration tests for the background sweeper.
//!
//! The sweeper only touches entries through `Sweep::sweep_expired`, so
//! `len()` (which counts expired-but-unswept entries) shows whether it ran.

use std::sync::Arc;
use std::time::Duration;

use shipsmind_cache::{CacheConfig, SharedCache, Sweep, spawn_sweeper};

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

/// Lets the sweeper task run after a clock advance.
async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_purges_all_caches_without_reads() {
    let prefs = Arc::new(SharedCache::new("preferences", CacheConfig::preferences()));
    let sessions = Arc::new(SharedCache::new("session_info", CacheConfig::session_info()));
    let routes = Arc::new(SharedCache::new("route_access", CacheConfig::route_access()));

    prefs.set("prefs:u1", "dark".to_string());
    sessions.set("session:s1", 1u32);
    routes.set("route:u1:/leads", true);

    let caches: Vec<Arc<dyn Sweep>> = vec![
        prefs.clone() as Arc<dyn Sweep>,
        sessions.clone() as Arc<dyn Sweep>,
        routes.clone() as Arc<dyn Sweep>,
    ];
    let _sweeper = spawn_sweeper(caches, secs(60));

    // At t=60 the session (30s) and route (60s) entries are expired;
    // the preference entry (5 min) is not.
    tokio::time::advance(secs(60)).await;
    settle().await;

    assert_eq!(sessions.len(), 0);
    assert_eq!(routes.len(), 0);
    assert_eq!(prefs.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_waits_a_full_interval_before_first_pass() {
    let cache = Arc::new(SharedCache::new("session_info", CacheConfig::session_info()));
    cache.set("session:s1", 1u32);
    let _sweeper = spawn_sweeper(vec![cache.clone() as Arc<dyn Sweep>], secs(60));

    tokio::time::advance(secs(45)).await;
    settle().await;

    // Expired at 30s, but the first sweep is at 60s.
    assert_eq!(cache.len(), 1);

    tokio::time::advance(secs(15)).await;
    settle().await;
    assert_eq!(cache.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_sweeper_leaves_entries() {
    let cache = Arc::new(SharedCache::new("session_info", CacheConfig::session_info()));
    cache.set("session:s1", 1u32);
    let sweeper = spawn_sweeper(vec![cache.clone() as Arc<dyn Sweep>], secs(60));

    sweeper.stop();
    sweeper.stop();
    tokio::time::advance(secs(120)).await;
    settle().await;

    assert_eq!(cache.len(), 1);
    assert!(!sweeper.is_running());
}
