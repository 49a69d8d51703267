//! Global request rate limiting (token bucket)

use crate::error::ApiError;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_BURST: u32 = 200;
pub const DEFAULT_PER_SECOND: u32 = 100;

/// Token bucket shared by every route
pub struct RequestRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl RequestRateLimiter {
    /// `burst` tokens, refilled at `per_second`. Zero values are treated as 1.
    pub fn new(burst: u32, per_second: u32) -> Self {
        let per_second = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(per_second).allow_burst(burst);
        Self {
            limiter: RateLimiter::direct(quota),
        }
    }

    /// Take one token; `false` when the bucket is empty
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for RequestRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_BURST, DEFAULT_PER_SECOND)
    }
}

/// Middleware rejecting requests with 429 once the bucket is drained
pub async fn rate_limit(
    State(limiter): State<Arc<RequestRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.check() {
        warn!(path = %request.uri().path(), "Rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_throttle() {
        let limiter = RequestRateLimiter::new(3, 1);
        assert!(limiter.check());
        assert!(limiter.check());
        assert!(limiter.check());
        assert!(!limiter.check());
    }

    #[test]
    fn test_zero_quota_still_allows_one() {
        let limiter = RequestRateLimiter::new(0, 0);
        assert!(limiter.check());
        assert!(!limiter.check());
    }
}
