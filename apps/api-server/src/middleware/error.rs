//! Application error type rendered as the `{ "error": { code, message, details } }` envelope.

use std::time::Duration;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use inkwell_core::DomainError;
use inkwell_core::error::ConflictKind;
use inkwell_shared::ErrorResponse;
use inkwell_shared::response as codes;

#[derive(Debug, Error)]
pub enum AppError {
    /// Body or query failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Rejected by the input sanitizer.
    #[error("Invalid characters in request")]
    InvalidInput,

    #[error("Invalid post ID format")]
    InvalidPostId,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Post not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(ConflictKind),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Duration },

    #[error("Server misconfiguration: {0}")]
    Misconfigured(&'static str),

    /// A store operation failed; carries the static operation description.
    #[error("{0}")]
    Database(&'static str),
}

impl AppError {
    fn envelope(&self) -> ErrorResponse {
        match self {
            AppError::Validation(detail) => {
                ErrorResponse::new(codes::VALIDATION_FAILED, "Request validation failed")
                    .with_details(detail.clone())
            }
            AppError::InvalidInput => {
                ErrorResponse::new(codes::INVALID_INPUT, "Invalid characters in request")
                    .with_details("Request contains potentially dangerous patterns")
            }
            AppError::InvalidPostId => ErrorResponse::new(codes::BAD_REQUEST, "Invalid post ID format")
                .with_details("The provided post ID is not a valid UUID"),
            AppError::Unauthorized => ErrorResponse::new(codes::UNAUTHORIZED, "Unauthorized")
                .with_details("A valid X-API-Key header is required"),
            AppError::NotFound => ErrorResponse::new(codes::NOT_FOUND, "Post not found")
                .with_details("The requested post does not exist or has been deleted"),
            AppError::Conflict(ConflictKind::SlugTaken) => {
                ErrorResponse::new(codes::CONFLICT, "Post with this slug already exists")
                    .with_details("Please choose a different slug for your post")
            }
            AppError::Conflict(ConflictKind::AlreadyLiked) => {
                ErrorResponse::new(codes::CONFLICT, "Post already liked")
                    .with_details("You have already liked this post from this IP address")
            }
            AppError::RateLimited { .. } => {
                ErrorResponse::new(codes::RATE_LIMIT_EXCEEDED, "Too many requests")
                    .with_details("Please wait before trying again")
            }
            AppError::Misconfigured(detail) => {
                ErrorResponse::new(codes::SERVER_MISCONFIGURATION, "Server configuration error")
                    .with_details(*detail)
            }
            AppError::Database(operation) => ErrorResponse::new(codes::DATABASE_ERROR, *operation)
                .with_details("An error occurred while accessing the database"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidInput | AppError::InvalidPostId => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Misconfigured(_) | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());

        if let AppError::RateLimited { retry_after } = self {
            // Whole seconds, rounded up, never zero
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .insert_header(("Retry-After", secs.max(1).to_string()))
                .insert_header(("X-RateLimit-Remaining", "0"));
        }

        response.json(self.envelope())
    }
}

// Conversion from domain errors. Store failures are logged here with the
// driver error; the client only sees the static operation description.
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, key } => {
                tracing::info!(entity = entity_type, key = %key, "Not found");
                AppError::NotFound
            }
            DomainError::Validation(msg) => {
                tracing::info!(reason = %msg, "Validation failed");
                AppError::Validation(msg)
            }
            DomainError::Conflict(kind) => {
                tracing::info!(conflict = %kind, "Conflict");
                AppError::Conflict(kind)
            }
            DomainError::Store { operation, source } => {
                tracing::error!(operation, error = %source, "Store operation failed");
                AppError::Database(operation)
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
