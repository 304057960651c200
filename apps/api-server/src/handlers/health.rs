//! Health check endpoint.

use actix_web::HttpResponse;

use inkwell_shared::dto::HealthResponse;

/// GET /health
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        message: "Blog API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
