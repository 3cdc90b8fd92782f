//! Exponential backoff for eventually-consistent reads.
//!
//! Newly created resources (sub-accounts in particular) may not be readable
//! right away. [`retry_notify`] repeats an operation with growing, randomized
//! delays until it succeeds, fails with an error that cannot clear up, or the
//! elapsed-time budget is spent.

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;

/// Backoff schedule.
///
/// The un-randomized interval after attempt `n` (0-based) is
/// `initial_interval * multiplier^n`, capped at `max_interval`. Each actual
/// delay is drawn uniformly from `interval * (1 ± randomization_factor)`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use shopping_samples::retry::ExponentialBackoff;
///
/// let policy = ExponentialBackoff::eventual_consistency();
/// assert_eq!(policy.initial_interval, Duration::from_secs(5));
/// assert_eq!(policy.max_elapsed_time, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    /// First retry interval
    pub initial_interval: Duration,
    /// Cap on any single interval
    pub max_interval: Duration,
    /// Give up once this much time has passed since the first attempt
    pub max_elapsed_time: Duration,
    /// Growth factor between intervals
    pub multiplier: f64,
    /// Jitter as a fraction of the interval, in `[0, 1]`
    pub randomization_factor: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(60),
            max_elapsed_time: Duration::from_secs(15 * 60),
            multiplier: 1.5,
            randomization_factor: 0.5,
        }
    }
}

impl ExponentialBackoff {
    /// Schedule used when waiting for a freshly created resource:
    /// 5 s initial interval, 30 s max interval, 60 s total
    #[must_use]
    pub fn eventual_consistency() -> Self {
        Self {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(30),
            max_elapsed_time: Duration::from_secs(60),
            ..Self::default()
        }
    }

    /// Un-randomized interval after the given (0-based) failed attempt
    #[must_use]
    pub fn interval_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_interval.as_secs_f64() {
            return self.max_interval;
        }
        Duration::from_secs_f64(secs)
    }

    /// Apply jitter to `interval`
    #[must_use]
    pub fn randomize(&self, interval: Duration) -> Duration {
        let factor = self.randomization_factor.clamp(0.0, 1.0);
        if factor == 0.0 {
            return interval;
        }
        let delta = interval.as_secs_f64() * factor;
        let low = interval.as_secs_f64() - delta;
        let high = interval.as_secs_f64() + delta;
        Duration::from_secs_f64(rand::thread_rng().gen_range(low..=high))
    }
}

/// Run `operation` until it succeeds, sleeping between failures.
///
/// Errors for which `is_retryable` returns `false` are returned at once.
/// Otherwise `notify` is called with the error and the delay before the next
/// attempt; once waiting again would exceed `max_elapsed_time`, the last
/// error is returned.
///
/// # Errors
///
/// Returns the first permanent error, or the last error once the time budget
/// is spent.
pub async fn retry_notify<F, Fut, T, E, R, N>(
    policy: &ExponentialBackoff,
    mut operation: F,
    is_retryable: R,
    mut notify: N,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
    N: FnMut(&E, Duration),
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if !is_retryable(&error) => {
                tracing::debug!(
                    attempts = attempt + 1,
                    error = %error,
                    "Permanent failure, not retrying"
                );
                return Err(error);
            }
            Err(error) => {
                let delay = policy.randomize(policy.interval_for_attempt(attempt));
                if started.elapsed() + delay > policy.max_elapsed_time {
                    tracing::warn!(
                        attempts = attempt + 1,
                        elapsed_ms = started.elapsed().as_millis(),
                        error = %error,
                        "Giving up after retries"
                    );
                    return Err(error);
                }

                tracing::debug!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "Operation failed, retrying"
                );
                notify(&error, delay);
                tokio::time::sleep(delay).await;
                attempt = attempt.saturating_add(1);
            }
        }
    }
}
