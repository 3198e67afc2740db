use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::http::{HttpHeaders, header_get};

/// Total request quota for the current window.
pub const RATE_LIMIT_HEADER: &str = "x-ratelimit-limit";
/// Requests left in the current window.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Epoch seconds at which the window resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limit state reported by GitHub response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Maximum requests allowed per window.
    pub limit: u64,
    /// Remaining requests in the current window.
    pub remaining: u64,
    /// When the window resets, if reported.
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitInfo {
    /// Extract rate limit info from response headers.
    ///
    /// Returns `None` unless both the limit and remaining headers are present
    /// and integer-valued.
    pub fn from_headers(headers: &HttpHeaders) -> Option<Self> {
        let limit = parse_u64(headers, RATE_LIMIT_HEADER)?;
        let remaining = remaining_quota(headers)?;
        let reset_at = header_get(headers, RATE_LIMIT_RESET_HEADER)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0));
        Some(Self {
            limit,
            remaining,
            reset_at,
        })
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Parse `x-ratelimit-remaining` on its own.
pub fn remaining_quota(headers: &HttpHeaders) -> Option<u64> {
    parse_u64(headers, RATE_LIMIT_REMAINING_HEADER)
}

fn parse_u64(headers: &HttpHeaders, name: &str) -> Option<u64> {
    header_get(headers, name).and_then(|v| v.trim().parse::<u64>().ok())
}

/// A proactive API rate limiter using the governor crate.
///
/// The gateway waits on it before every request when one is configured.
///
/// # Example
///
/// ```ignore
/// use usersearch::rate_limit::ApiRateLimiter;
///
/// let limiter = ApiRateLimiter::new(10); // 10 requests per second
/// limiter.wait().await;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter with the specified requests per second.
    ///
    /// A value of 0 is treated as 1.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
        }
    }

    /// Wait until a request is allowed by the rate limiter.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HttpHeaders {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_full_header_set() {
        let info = RateLimitInfo::from_headers(&headers(&[
            ("X-RateLimit-Limit", "30"),
            ("X-RateLimit-Remaining", "0"),
            ("X-RateLimit-Reset", "1732780800"),
        ]))
        .unwrap();
        assert_eq!(info.limit, 30);
        assert_eq!(info.remaining, 0);
        assert!(info.is_exhausted());
        assert_eq!(
            info.reset_at,
            DateTime::from_timestamp(1_732_780_800, 0)
        );
    }

    #[test]
    fn reset_is_optional() {
        let info = RateLimitInfo::from_headers(&headers(&[
            ("x-ratelimit-limit", "10"),
            ("x-ratelimit-remaining", "4"),
        ]))
        .unwrap();
        assert_eq!(info.remaining, 4);
        assert!(!info.is_exhausted());
        assert!(info.reset_at.is_none());
    }

    #[test]
    fn missing_or_non_integer_headers_yield_none() {
        assert!(RateLimitInfo::from_headers(&headers(&[("x-ratelimit-remaining", "0")])).is_none());
        assert!(
            RateLimitInfo::from_headers(&headers(&[
                ("x-ratelimit-limit", "ten"),
                ("x-ratelimit-remaining", "0"),
            ]))
            .is_none()
        );
        assert_eq!(remaining_quota(&headers(&[("x-ratelimit-remaining", "zero")])), None);
        assert_eq!(remaining_quota(&headers(&[("x-ratelimit-remaining", " 0 ")])), Some(0));
    }

    #[tokio::test]
    async fn limiter_allows_first_request_immediately() {
        let limiter = ApiRateLimiter::new(0);
        tokio::time::timeout(Duration::from_secs(1), limiter.wait())
            .await
            .expect("first permit should be immediate");
    }
}
