//! # Inkwell Infrastructure
//!
//! Concrete implementations of the ports defined in `inkwell-core`.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL storage via SeaORM
//!
//! Without `postgres` only the in-memory repositories are available.

pub mod auth;
pub mod database;
pub mod jobs;
pub mod rate_limit;

pub use auth::ApiKeyVerifier;
pub use database::{InMemoryLikeRepository, InMemoryPostRepository, InMemoryViewRepository};
pub use jobs::{InMemoryTaskQueue, TaskQueueConfig};
pub use rate_limit::SlidingWindowRateLimiter;

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConfig, PostgresLikeRepository, PostgresPostRepository, PostgresViewRepository,
};
