//! Rate limiting port.

use std::time::Duration;

/// How many requests a key may make within a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub max_requests: u32,
    pub window: Duration,
}

impl Quota {
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub const fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the oldest tracked request leaves the window.
    pub reset_after: Duration,
}

/// Rate limiter trait - abstraction over rate limiting backends.
///
/// A check is atomic: purging expired entries, counting and recording the
/// admitted request happen as one step with respect to concurrent checks.
pub trait RateLimiter: Send + Sync {
    /// Check if a request is allowed and, if so, record it.
    /// Rejected attempts are not recorded.
    fn check(&self, key: &str, quota: Quota) -> RateLimitResult;

    fn admit(&self, key: &str, max_requests: u32, window: Duration) -> bool {
        self.check(key, Quota::new(max_requests, window)).allowed
    }

    /// Drop keys with no requests inside `window`. Returns how many were dropped.
    fn sweep(&self, window: Duration) -> usize;

    /// Number of distinct keys currently tracked.
    fn tracked_keys(&self) -> usize;
}
