//! Rate limiting implementations.

mod memory;

pub use memory::{DEFAULT_SWEEP_THRESHOLD, SlidingWindowRateLimiter};
