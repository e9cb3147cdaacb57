//! Rate limiting middleware using token bucket algorithm
//!
//! Applied to bulk upload only; imports are the expensive endpoint.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use printtrack_common::{config::RateLimitConfig, errors::AppError};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter using governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Limiter plus the quota it enforces, shared as middleware state
#[derive(Clone)]
pub struct UploadLimiter {
    limiter: Arc<GlobalRateLimiter>,
    per_second: u32,
}

impl UploadLimiter {
    /// Create a new rate limiter. Zero values are raised to one.
    pub fn new(config: &RateLimitConfig) -> Self {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            per_second: per_second.get(),
        }
    }

    pub fn check(&self) -> Result<(), AppError> {
        self.limiter
            .check()
            .map_err(|_| AppError::RateLimited { limit: self.per_second })
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limiter): State<UploadLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Err(e) = limiter.check() {
        tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
        return Err(e);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(requests_per_second: u32, burst: u32) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_second,
            burst,
            enabled: true,
        }
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = UploadLimiter::new(&config(100, 200));
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_burst_is_enforced() {
        let limiter = UploadLimiter::new(&config(1, 2));
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());

        let err = limiter.check().unwrap_err();
        assert!(matches!(err, AppError::RateLimited { limit: 1 }));
    }

    #[test]
    fn test_zero_quota_is_clamped() {
        let limiter = UploadLimiter::new(&config(0, 0));
        assert!(limiter.check().is_ok());
    }
}
