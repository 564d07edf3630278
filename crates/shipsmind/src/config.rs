//! Configuration for the whole session support context.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shipsmind_cache::CacheConfig;
use shipsmind_retry::{DisplayMode, RetryPolicy};
use shipsmind_session::SessionConfig;

use crate::ShipsmindError;

/// Retry settings in config-file units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Per-attempt timeout; `null` disables it.
    pub call_timeout_ms: Option<u64>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            call_timeout_ms: policy.call_timeout.map(|t| t.as_millis() as u64),
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            call_timeout: self.call_timeout_ms.map(Duration::from_millis),
        }
        .validated()
    }
}

/// Everything a [`SessionSupport`](crate::SessionSupport) needs.
///
/// Every field has a default, so a config document only lists what it
/// changes:
///
/// ```rust
/// use shipsmind::SupportConfig;
///
/// let config = SupportConfig::from_json(r#"{
///     "session": { "warning_minutes": 2 },
///     "sweep_interval_secs": 30
/// }"#).unwrap();
///
/// assert_eq!(config.session.warning_minutes, 2);
/// assert_eq!(config.session.session_duration_minutes, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportConfig {
    pub session: SessionConfig,
    pub retry: RetrySettings,
    pub preferences_cache: CacheConfig,
    pub session_cache: CacheConfig,
    pub route_cache: CacheConfig,
    /// How often expired cache entries are purged. Default: 60.
    pub sweep_interval_secs: u64,
    /// Whether error views may include technical details.
    pub display_mode: DisplayMode,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            retry: RetrySettings::default(),
            preferences_cache: CacheConfig::preferences(),
            session_cache: CacheConfig::session_info(),
            route_cache: CacheConfig::route_access(),
            sweep_interval_secs: 60,
            display_mode: DisplayMode::default(),
        }
    }
}

impl SupportConfig {
    /// Longest allowed `sweep_interval_secs`: one day.
    pub const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

    /// Parses a JSON config document; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ShipsmindError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    /// Clamp and fix every nested config.
    pub fn validated(mut self) -> Self {
        self.session = self.session.validated();
        self.preferences_cache = self.preferences_cache.validated();
        self.session_cache = self.session_cache.validated();
        self.route_cache = self.route_cache.validated();
        self.sweep_interval_secs = self.sweep_interval_secs.clamp(1, Self::MAX_SWEEP_INTERVAL_SECS);
        self
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
