//! Bounded retry with exponential backoff, keyed by call context.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{AuthError, Classifier, Failure};

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How hard [`RetryRunner`] tries before giving up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Default: 3 (so 4 attempts total).
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each one after.
    /// Default: 1000ms.
    pub base_delay: Duration,
    /// Per-attempt time limit. An attempt that exceeds it counts as a
    /// network failure (and is retried). `None` waits forever.
    /// Default: 15s.
    pub call_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            call_timeout: Some(Duration::from_secs(15)),
        }
    }
}

impl RetryPolicy {
    /// Highest allowed `max_retries`. With the default base delay the last
    /// backoff is already over 8 minutes.
    pub const MAX_RETRIES_CAP: u32 = 10;

    /// Clamp out-of-range values so the policy is safe to use.
    pub fn validated(mut self) -> Self {
        if self.max_retries > Self::MAX_RETRIES_CAP {
            warn!(
                max_retries = self.max_retries,
                cap = Self::MAX_RETRIES_CAP,
                "max_retries exceeds cap, clamping"
            );
            self.max_retries = Self::MAX_RETRIES_CAP;
        }
        if self.call_timeout == Some(Duration::ZERO) {
            warn!("zero call_timeout would fail every attempt, disabling");
            self.call_timeout = None;
        }
        self
    }

    /// Delay before retry number `attempt + 1`: `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

// ---------------------------------------------------------------------------
// RetryRunner
// ---------------------------------------------------------------------------

/// Runs async operations with bounded, per-context retry.
///
/// Each call is tagged with a context string ("preferences:load",
/// "verification:attempt", …). The attempt counter for a context lives in
/// a shared map so it can be observed, and is cleared on success or final
/// failure. Distinct contexts never share a retry budget.
#[derive(Debug)]
pub struct RetryRunner {
    policy: RetryPolicy,
    classifier: Classifier,
    attempts: Mutex<HashMap<String, u32>>,
}

impl Default for RetryRunner {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Classifier::default())
    }
}

impl RetryRunner {
    pub fn new(policy: RetryPolicy, classifier: Classifier) -> Self {
        Self {
            policy: policy.validated(),
            classifier,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `operation` under the policy's default retry ceiling.
    pub async fn run<T, F, Fut>(&self, context: &str, operation: F) -> Result<T, AuthError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.run_with_limit(context, self.policy.max_retries, operation)
            .await
    }

    /// Runs `operation`, retrying transient failures up to `max_retries`
    /// times with exponential backoff.
    ///
    /// Non-retryable failures make exactly one attempt and return at once,
    /// with no backoff wait. Retries for one call are strictly sequential:
    /// each waits out its full delay before the next attempt starts.
    pub async fn run_with_limit<T, F, Fut>(
        &self,
        context: &str,
        max_retries: u32,
        mut operation: F,
    ) -> Result<T, AuthError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        let max_retries = max_retries.min(RetryPolicy::MAX_RETRIES_CAP);

        loop {
            let outcome = match self.policy.call_timeout {
                Some(limit) => tokio::time::timeout(limit, operation())
                    .await
                    .unwrap_or(Err(Failure::Timeout(limit))),
                None => operation().await,
            };

            let failure = match outcome {
                Ok(value) => {
                    if self.clear(context) > 0 {
                        debug!(context, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            let kind = self.classifier.classify(Some(&failure));
            let attempt = self.attempts(context);

            if attempt < max_retries && self.classifier.is_retryable(kind, &failure) {
                self.set_attempts(context, attempt + 1);
                let delay = self.policy.delay_for(attempt);
                info!(
                    context,
                    attempt = attempt + 1,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    %kind,
                    "retrying after failure"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            self.clear(context);
            return Err(self
                .classifier
                .normalize_as(kind, Some(&failure), Some(context)));
        }
    }

    /// Retries already spent by the in-flight call for `context`.
    pub fn attempts(&self, context: &str) -> u32 {
        self.lock().get(context).copied().unwrap_or(0)
    }

    /// The policy this runner was built with (after validation).
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The classifier used to decide retryability.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    fn set_attempts(&self, context: &str, attempts: u32) {
        self.lock().insert(context.to_string(), attempts);
    }

    /// Removes the counter, returning what it was.
    fn clear(&self, context: &str) -> u32 {
        self.lock().remove(context).unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, u32>> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
