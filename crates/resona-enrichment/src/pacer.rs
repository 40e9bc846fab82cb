use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Paces outgoing requests toward one catalog. Constructed explicitly and
/// injected into the client that needs it, so tests can pass [`NoopPacer`].
#[async_trait]
pub trait RequestPacer: Send + Sync {
    /// Suspends until the next request may go out.
    async fn acquire(&self);
}

/// Steady-rate pacer backed by a `governor` direct rate limiter.
pub struct GovernorPacer {
    limiter: DefaultDirectRateLimiter,
}

impl GovernorPacer {
    pub fn per_second(requests: u32) -> Self {
        let requests = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        GovernorPacer {
            limiter: RateLimiter::direct(Quota::per_second(requests)),
        }
    }
}

#[async_trait]
impl RequestPacer for GovernorPacer {
    async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

/// Pacer that never waits.
pub struct NoopPacer;

#[async_trait]
impl RequestPacer for NoopPacer {
    async fn acquire(&self) {}
}
