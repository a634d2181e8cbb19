//! Retry policy with fixed or exponential backoff.

use std::time::Duration;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Fixed delay between retries.
    Fixed { delay: Duration },
    /// Exponential delay: `base * (factor ^ attempt)`, capped at `max`,
    /// optionally jittered by +/- 50%.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            factor: 2.0,
            max: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt as i32);
                let seconds = base.as_secs_f64() * scale;
                let capped_seconds = seconds.min(max.as_secs_f64());

                let mut delay = Duration::from_secs_f64(capped_seconds);

                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let random_offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// How often and how patiently the scheduler re-invokes a failed source
/// fetch. Whether an error is retried at all is decided by the error's
/// own `retryable` classification, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total invocation budget, first attempt included.
    pub const fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}
