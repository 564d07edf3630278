//! Per-operation duration tracking.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

/// Summary of the samples recorded for one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationStats {
    /// Number of samples currently retained (at most the sample cap).
    pub count: usize,
    /// Mean of the retained samples.
    pub average: Duration,
    /// Fastest retained sample.
    pub min: Duration,
    /// Slowest retained sample.
    pub max: Duration,
}

/// Whether each tracked auth operation is meeting its latency target.
///
/// An operation with no samples counts as meeting its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceTargets {
    /// `auth_check` averages under 200ms.
    pub auth_check: bool,
    /// `preferences_load` averages under 500ms.
    pub preferences_load: bool,
    /// `session_validation` averages under 100ms.
    pub session_validation: bool,
}

impl PerformanceTargets {
    /// `true` when every target is met.
    pub fn all_met(&self) -> bool {
        self.auth_check && self.preferences_load && self.session_validation
    }
}

/// Rolling duration samples keyed by operation name.
///
/// Only the most recent [`SAMPLE_CAP`](Self::SAMPLE_CAP) samples per
/// operation are kept. Safe to share across tasks behind an `Arc`; the
/// internal lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    samples: Mutex<HashMap<String, VecDeque<Duration>>>,
}

impl PerformanceMonitor {
    /// Samples retained per operation.
    pub const SAMPLE_CAP: usize = 100;

    /// Operation name for route/auth checks.
    pub const AUTH_CHECK: &'static str = "auth_check";
    /// Operation name for preference loads.
    pub const PREFERENCES_LOAD: &'static str = "preferences_load";
    /// Operation name for session validation.
    pub const SESSION_VALIDATION: &'static str = "session_validation";

    pub fn new() -> Self {
        Self::default()
    }

    /// Starts timing `operation`. The sample is recorded when the returned
    /// guard is dropped or [`finish`](TimingGuard::finish)ed.
    pub fn start_timing(self: &Arc<Self>, operation: &str) -> TimingGuard {
        TimingGuard {
            monitor: Arc::clone(self),
            operation: operation.to_string(),
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Records one sample for `operation`, evicting the oldest past the cap.
    pub fn record(&self, operation: &str, duration: Duration) {
        let mut samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        let series = samples.entry(operation.to_string()).or_default();
        series.push_back(duration);
        if series.len() > Self::SAMPLE_CAP {
            series.pop_front();
        }
        debug!(
            operation,
            duration_ms = duration.as_secs_f64() * 1000.0,
            "operation timed"
        );
    }

    /// Stats for one operation, or `None` if nothing was recorded.
    pub fn stats(&self, operation: &str) -> Option<OperationStats> {
        let samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        samples.get(operation).and_then(summarize)
    }

    /// Stats for every operation, sorted by name.
    pub fn all_stats(&self) -> BTreeMap<String, OperationStats> {
        let samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        samples
            .iter()
            .filter_map(|(name, series)| summarize(series).map(|s| (name.clone(), s)))
            .collect()
    }

    /// Checks the tracked auth operations against their latency targets.
    pub fn check_targets(&self) -> PerformanceTargets {
        let under = |op: &str, limit_ms: u64| {
            self.stats(op)
                .is_none_or(|s| s.average < Duration::from_millis(limit_ms))
        };
        let targets = PerformanceTargets {
            auth_check: under(Self::AUTH_CHECK, 200),
            preferences_load: under(Self::PREFERENCES_LOAD, 500),
            session_validation: under(Self::SESSION_VALIDATION, 100),
        };
        if !targets.all_met() {
            warn!(?targets, "auth operations missing latency targets");
        }
        targets
    }

    /// Drops every recorded sample.
    pub fn reset(&self) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn summarize(series: &VecDeque<Duration>) -> Option<OperationStats> {
    let min = series.iter().min().copied()?;
    let max = series.iter().max().copied()?;
    let total: Duration = series.iter().sum();
    Some(OperationStats {
        count: series.len(),
        average: total / series.len() as u32,
        min,
        max,
    })
}

/// Drop guard that records elapsed time into a [`PerformanceMonitor`].
///
/// Recording on drop means early returns and `?` still produce a sample.
#[derive(Debug)]
pub struct TimingGuard {
    monitor: Arc<PerformanceMonitor>,
    operation: String,
    start: Instant,
    recorded: bool,
}

impl TimingGuard {
    /// Records the sample now and returns the elapsed time.
    pub fn finish(mut self) -> Duration {
        self.record_once()
    }

    fn record_once(&mut self) -> Duration {
        let elapsed = self.start.elapsed();
        if !self.recorded {
            self.recorded = true;
            self.monitor.record(&self.operation, elapsed);
        }
        elapsed
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        self.record_once();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_stats_none_for_unknown_operation() {
        let m = PerformanceMonitor::new();
        assert!(m.stats("nope").is_none());
    }

    #[test]
    fn test_stats_summarizes_samples() {
        let m = PerformanceMonitor::new();
        m.record("op", ms(100));
        m.record("op", ms(300));
        m.record("op", ms(200));

        let s = m.stats("op").unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.average, ms(200));
        assert_eq!(s.min, ms(100));
        assert_eq!(s.max, ms(300));
    }

    #[test]
    fn test_record_keeps_only_last_hundred() {
        let m = PerformanceMonitor::new();
        // One slow outlier first, then 100 fast samples push it out.
        m.record("op", ms(10_000));
        for _ in 0..PerformanceMonitor::SAMPLE_CAP {
            m.record("op", ms(1));
        }

        let s = m.stats("op").unwrap();
        assert_eq!(s.count, 100);
        assert_eq!(s.max, ms(1));
    }

    #[test]
    fn test_check_targets_empty_monitor_meets_all() {
        let m = PerformanceMonitor::new();
        assert!(m.check_targets().all_met());
    }

    #[test]
    fn test_check_targets_flags_slow_preferences_load() {
        let m = PerformanceMonitor::new();
        m.record(PerformanceMonitor::PREFERENCES_LOAD, ms(800));
        m.record(PerformanceMonitor::AUTH_CHECK, ms(50));

        let t = m.check_targets();
        assert!(!t.preferences_load);
        assert!(t.auth_check);
        assert!(t.session_validation);
        assert!(!t.all_met());
    }

    #[test]
    fn test_all_stats_sorted_by_name() {
        let m = PerformanceMonitor::new();
        m.record("b", ms(1));
        m.record("a", ms(1));

        let names: Vec<_> = m.all_stats().into_keys().collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timing_guard_records_on_drop() {
        let m = Arc::new(PerformanceMonitor::new());
        {
            let _guard = m.start_timing("op");
            tokio::time::advance(ms(250)).await;
        }

        let s = m.stats("op").unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.max, ms(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timing_guard_finish_records_once() {
        let m = Arc::new(PerformanceMonitor::new());
        let guard = m.start_timing("op");
        tokio::time::advance(ms(40)).await;

        let elapsed = guard.finish();

        assert_eq!(elapsed, ms(40));
        assert_eq!(m.stats("op").unwrap().count, 1);
    }
}
