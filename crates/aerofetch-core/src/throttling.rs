use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::error::FetchError;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Request budget: at most `limit` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuota {
    pub limit: u32,
    pub window: Duration,
}

impl RateQuota {
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    pub const fn per_second(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(1))
    }
}

/// Token bucket shared by every request a source run makes.
///
/// One gate is built fresh per source per run and handed to the adapter
/// through the fetch context, so an adapter's internal fan-out draws from
/// the same budget as the top-level call. Cloning shares the bucket.
/// `governor` handles the concurrent decrement/refill; no lock spans
/// sources.
#[derive(Clone)]
pub struct RateGate {
    inner: Option<Arc<GateInner>>,
}

struct GateInner {
    limiter: DirectRateLimiter,
    clock: DefaultClock,
}

impl RateGate {
    pub fn new(quota: RateQuota) -> Result<Self, FetchError> {
        let burst = NonZeroU32::new(quota.limit).ok_or_else(|| {
            FetchError::validation_setup("rate quota limit must be greater than zero")
        })?;
        if quota.window.is_zero() {
            return Err(FetchError::validation_setup(
                "rate quota window must be greater than zero",
            ));
        }

        let seconds_per_cell = quota.window.as_secs_f64() / f64::from(quota.limit);
        let period = Duration::from_secs_f64(seconds_per_cell.max(0.001));
        let governor_quota = Quota::with_period(period)
            .expect("period is always greater than zero")
            .allow_burst(burst);

        let clock = DefaultClock::default();
        Ok(Self {
            inner: Some(Arc::new(GateInner {
                limiter: RateLimiter::direct_with_clock(governor_quota, &clock),
                clock,
            })),
        })
    }

    /// Gate that never blocks, for sources with no configured quota.
    pub fn unlimited() -> Self {
        Self { inner: None }
    }

    pub fn is_limited(&self) -> bool {
        self.inner.is_some()
    }

    /// Wait until one unit of budget is available.
    pub async fn acquire(&self) {
        let Some(inner) = &self.inner else {
            return;
        };

        loop {
            match inner.limiter.check() {
                Ok(_) => return,
                Err(not_until) => {
                    let wait = not_until.wait_time_from(inner.clock.now());
                    tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
                }
            }
        }
    }

    /// Take budget if immediately available.
    pub fn try_acquire(&self) -> bool {
        match &self.inner {
            None => true,
            Some(inner) => inner.limiter.check().is_ok(),
        }
    }
}

impl std::fmt::Debug for RateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGate")
            .field("limited", &self.is_limited())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_up_to_the_limit_then_blocks() {
        let gate = RateGate::new(RateQuota::new(2, Duration::from_secs(60))).expect("valid quota");

        assert!(gate.try_acquire());
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
    }

    #[test]
    fn zero_limit_is_a_setup_error() {
        let err = RateGate::new(RateQuota::new(0, Duration::from_secs(1))).expect_err("must fail");
        assert_eq!(err.code(), "fetch.validation_setup");
    }

    #[test]
    fn unlimited_gate_never_blocks() {
        let gate = RateGate::unlimited();
        for _ in 0..1_000 {
            assert!(gate.try_acquire());
        }
    }

    #[tokio::test]
    async fn clones_share_one_budget() {
        let gate = RateGate::new(RateQuota::new(3, Duration::from_secs(60))).expect("valid quota");
        let sibling = gate.clone();

        gate.acquire().await;
        sibling.acquire().await;
        gate.acquire().await;
        assert!(!sibling.try_acquire());
    }
}
