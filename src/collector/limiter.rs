//! Adaptive rate limiter with exponential backoff
//!
//! One limiter instance is one logical channel; search and enrichment run
//! separate instances so enrichment pressure never throttles search. The
//! limiter is the only gate between consecutive requests issued by a given
//! worker; it does not serialize across workers.

use rand::Rng;
use std::sync::Mutex;
use std::time::Duration;

/// Successes in a row before the delay decays
const SUCCESS_STREAK: u32 = 5;

/// Decay factor applied after a success streak
const DECAY: f64 = 0.9;

/// Backoff multiplier for ordinary failures
const BACKOFF: f64 = 2.0;

/// Backoff multiplier when the provider signals throttling
const RATE_LIMIT_BACKOFF: f64 = 4.0;

/// Uniform jitter applied to every wait, ±30%
const JITTER: f64 = 0.3;

/// Hard ceiling on the delay regardless of accumulated backoff
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Shortest sleep the limiter will ever perform
const MIN_SLEEP: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct Inner {
    current: Duration,
    streak: u32,
}

/// Per-channel delay controller. Thread-safe; cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    base: Duration,
    max: Duration,
    inner: Mutex<Inner>,
}

impl RateLimiter {
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            max: MAX_DELAY,
            inner: Mutex::new(Inner {
                current: base,
                streak: 0,
            }),
        }
    }

    /// Records a successful operation. After [`SUCCESS_STREAK`] consecutive
    /// successes the delay decays toward the base, never below it.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.streak += 1;
        if inner.streak >= SUCCESS_STREAK {
            inner.current = inner.current.mul_f64(DECAY).max(self.base);
            inner.streak = 0;
        }
    }

    /// Records a failed operation, doubling the delay (quadrupling when the
    /// failure was a throttling signal), up to the ceiling.
    pub fn record_failure(&self, rate_limited: bool) {
        let factor = if rate_limited {
            RATE_LIMIT_BACKOFF
        } else {
            BACKOFF
        };
        let mut inner = self.inner.lock().unwrap();
        inner.streak = 0;
        inner.current = inner.current.mul_f64(factor).min(self.max);
    }

    /// Current delay without jitter
    pub fn current_delay(&self) -> Duration {
        self.inner.lock().unwrap().current
    }

    /// Sleeps for the current delay with ±30% uniform jitter applied
    pub async fn wait(&self) {
        let delay = self.current_delay();
        let factor = rand::thread_rng().gen_range(1.0 - JITTER..=1.0 + JITTER);
        tokio::time::sleep(delay.mul_f64(factor).max(MIN_SLEEP)).await;
    }

    /// Delay before re-attempting a failed cell: `base · 2^attempt`, capped
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        self.base
            .mul_f64(BACKOFF.powi(attempt.min(31) as i32))
            .min(self.max)
    }
}
