//! Rate limiting middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use axum::response::IntoResponse;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

use super::error::ApiError;

/// Shared rate limiter type.
pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Fallback quota when the configured one is zero.
const FALLBACK_RPM: NonZeroU32 = match NonZeroU32::new(60) {
    Some(rpm) => rpm,
    None => NonZeroU32::MIN,
};

/// Create a global rate limiter allowing `requests_per_minute`.
#[must_use]
pub fn create_rate_limiter(requests_per_minute: u32) -> SharedRateLimiter {
    let rpm = NonZeroU32::new(requests_per_minute).unwrap_or(FALLBACK_RPM);
    Arc::new(RateLimiter::direct(Quota::per_minute(rpm)))
}

/// Reject requests over the quota with `429 Too Many Requests`.
pub async fn rate_limit(limiter: SharedRateLimiter, request: Request, next: Next) -> Response {
    match limiter.check() {
        Ok(()) => next.run(request).await,
        Err(_) => {
            debug!(uri = %request.uri(), "Rate limit exceeded");
            ApiError::RateLimitExceeded.into_response()
        }
    }
}
