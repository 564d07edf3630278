//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// TTL and size bound for one cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long an entry stays valid after it is set.
    #[serde(with = "millis")]
    pub ttl: Duration,
    /// Maximum number of entries before the oldest-inserted is evicted.
    pub max_size: usize,
}

impl CacheConfig {
    /// User preferences: 5 minutes, 100 users.
    pub const fn preferences() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            max_size: 100,
        }
    }

    /// Session metadata: 30 seconds, 50 sessions.
    pub const fn session_info() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_size: 50,
        }
    }

    /// Per-route access decisions: 60 seconds, 200 decisions.
    pub const fn route_access() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_size: 200,
        }
    }

    /// Clamp out-of-range values. A zero `max_size` would evict every
    /// entry on insert, so it becomes 1.
    pub fn validated(mut self) -> Self {
        if self.max_size == 0 {
            warn!("cache max_size of 0, using 1");
            self.max_size = 1;
        }
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::preferences()
    }
}

/// Durations as integer milliseconds in config files.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(CacheConfig::preferences().ttl, Duration::from_secs(300));
        assert_eq!(CacheConfig::preferences().max_size, 100);
        assert_eq!(CacheConfig::session_info().ttl, Duration::from_secs(30));
        assert_eq!(CacheConfig::session_info().max_size, 50);
        assert_eq!(CacheConfig::route_access().ttl, Duration::from_secs(60));
        assert_eq!(CacheConfig::route_access().max_size, 200);
    }

    #[test]
    fn test_validated_fixes_zero_size() {
        let c = CacheConfig {
            ttl: Duration::from_secs(1),
            max_size: 0,
        }
        .validated();
        assert_eq!(c.max_size, 1);
    }

    #[test]
    fn test_ttl_deserializes_from_millis() {
        let c: CacheConfig = serde_json::from_str(r#"{"ttl": 1500, "max_size": 7}"#).unwrap();
        assert_eq!(c.ttl, Duration::from_millis(1500));
        assert_eq!(c.max_size, 7);
    }
}
