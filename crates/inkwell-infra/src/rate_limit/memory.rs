//! In-memory sliding window rate limiter.
//!
//! Keeps the timestamps of admitted requests per key. State is per process and
//! is lost on restart.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use inkwell_core::ports::{Quota, RateLimitResult, RateLimiter};

/// Distinct keys tracked before a check sweeps idle keys inline.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 1000;

/// Sliding window limiter keyed by client identity.
///
/// A key may make at most `quota.max_requests` admitted requests in any
/// trailing `quota.window`. Rejected attempts do not consume quota.
pub struct SlidingWindowRateLimiter {
    requests: Mutex<HashMap<String, VecDeque<Instant>>>,
    sweep_threshold: usize,
}

impl SlidingWindowRateLimiter {
    pub fn new() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_THRESHOLD)
    }

    pub fn with_sweep_threshold(sweep_threshold: usize) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            sweep_threshold,
        }
    }

    /// Check and record a request as of `now`.
    pub fn check_at(&self, key: &str, quota: Quota, now: Instant) -> RateLimitResult {
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());

        if requests.len() > self.sweep_threshold {
            let dropped = sweep_entries(&mut requests, quota.window, now);
            tracing::debug!(dropped, remaining = requests.len(), "Swept idle rate limit keys");
        }

        let entry = requests.entry(key.to_owned()).or_default();
        purge(entry, quota.window, now);

        let max = quota.max_requests as usize;
        if entry.len() >= max {
            let reset_after = entry
                .front()
                .map(|oldest| (*oldest + quota.window).saturating_duration_since(now))
                .unwrap_or(quota.window);
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_after,
            };
        }

        entry.push_back(now);
        let reset_after = entry
            .front()
            .map(|oldest| (*oldest + quota.window).saturating_duration_since(now))
            .unwrap_or(quota.window);

        RateLimitResult {
            allowed: true,
            remaining: (max - entry.len()) as u32,
            reset_after,
        }
    }

    /// Sweep as of `now`.
    pub fn sweep_at(&self, window: Duration, now: Instant) -> usize {
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        sweep_entries(&mut requests, window, now)
    }
}

impl Default for SlidingWindowRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    fn check(&self, key: &str, quota: Quota) -> RateLimitResult {
        self.check_at(key, quota, Instant::now())
    }

    fn sweep(&self, window: Duration) -> usize {
        self.sweep_at(window, Instant::now())
    }

    fn tracked_keys(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// Drop timestamps at or before `now - window`. Timestamps are kept in
/// insertion order, so expired ones are always at the front.
fn purge(entry: &mut VecDeque<Instant>, window: Duration, now: Instant) {
    let Some(cutoff) = now.checked_sub(window) else {
        return;
    };
    while entry.front().is_some_and(|t| *t <= cutoff) {
        entry.pop_front();
    }
}

fn sweep_entries(
    requests: &mut HashMap<String, VecDeque<Instant>>,
    window: Duration,
    now: Instant,
) -> usize {
    let before = requests.len();
    requests.retain(|_, times| {
        purge(times, window, now);
        !times.is_empty()
    });
    before - requests.len()
}
