//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod rate_limit;
mod repository;
mod task_queue;

pub use auth::{AuthError, KeyVerifier};
pub use rate_limit::{Quota, RateLimitResult, RateLimiter};
pub use repository::{BaseRepository, LikeRepository, PostRepository, ViewRepository};
pub use task_queue::{QueueStats, Task, TaskOutcome, TaskQueue, TaskQueueError};
