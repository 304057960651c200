//! Storage: in-memory repositories and the PostgreSQL backend.

mod memory;

#[cfg(feature = "postgres")]
mod connections;
#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;
#[cfg(feature = "postgres")]
pub mod schema;

pub use memory::{InMemoryLikeRepository, InMemoryPostRepository, InMemoryViewRepository};

#[cfg(feature = "postgres")]
pub use connections::{ConnectError, DatabaseConfig, connect};
#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresLikeRepository, PostgresPostRepository, PostgresViewRepository};
#[cfg(feature = "postgres")]
pub use schema::ensure_schema;
