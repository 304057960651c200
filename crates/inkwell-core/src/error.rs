//! Domain-level error types.

use thiserror::Error;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with key {key}")]
    NotFound { entity_type: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(ConflictKind),

    /// A store operation failed. `operation` is a static, client-safe description.
    #[error("{operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: RepoError,
    },
}

impl DomainError {
    pub fn post_not_found(key: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity_type: "Post",
            key: key.into(),
        }
    }

    pub(crate) fn store(operation: &'static str) -> impl FnOnce(RepoError) -> Self {
        move |source| DomainError::Store { operation, source }
    }
}

/// What a conflict collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    SlugTaken,
    AlreadyLiked,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::SlugTaken => write!(f, "slug already in use"),
            ConflictKind::AlreadyLiked => write!(f, "post already liked by this identity"),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
