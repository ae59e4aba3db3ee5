//! Client-side request throttling
//!
//! A governor token bucket refilled at the configured rate, holding at most one
//! second's worth of requests.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Shared requests-per-second limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<DirectLimiter>,
    per_second: NonZeroU32,
}

impl RateLimiter {
    /// Allow `per_second` requests each second (0 is treated as 1)
    pub fn per_second(per_second: u32) -> Self {
        let per_second = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: Arc::new(Governor::direct(Quota::per_second(per_second))),
            per_second,
        }
    }

    /// Configured ceiling
    pub fn rate(&self) -> u32 {
        self.per_second.get()
    }

    /// Wait until the next request may be sent
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("per_second", &self.per_second)
            .finish_non_exhaustive()
    }
}
