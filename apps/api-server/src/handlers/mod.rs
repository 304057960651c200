//! HTTP handlers and route configuration.

mod engagement;
mod health;
mod posts;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, error, middleware::Condition, web};
use uuid::Uuid;

use inkwell_core::domain::Post;
use inkwell_core::ports::RateLimiter;
use inkwell_shared::dto::PostResponse;

use crate::middleware::{ApiKeyAuth, AppError, InputSanitizer, PublicTiers, RateLimitMiddleware};
use crate::state::AppState;

/// Largest accepted JSON body.
const JSON_LIMIT: usize = 256 * 1024;

/// Configure all application routes.
///
/// Admin routes sit behind the admin limiter and then the API key check;
/// public routes behind the tiered public limiter when it is enabled.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    let trust_proxy = state.config.trust_proxy_headers;
    let limits = &state.config.rate_limits;

    let admin_limiter: std::sync::Arc<dyn RateLimiter> = state.admin_limiter.clone();
    let public_limiter: std::sync::Arc<dyn RateLimiter> = state.public_limiter.clone();
    let tiers = PublicTiers::from_config(limits);

    let admin = || ApiKeyAuth::new(state.key_verifier.clone(), trust_proxy);
    let admin_limit =
        || RateLimitMiddleware::admin(admin_limiter.clone(), limits.admin_quota(), trust_proxy);
    let public_limit = || {
        Condition::new(
            limits.public_enabled,
            RateLimitMiddleware::public(public_limiter.clone(), tiers, trust_proxy),
        )
    };

    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api/v1/posts")
                .service(
                    web::resource("")
                        .route(web::get().to(posts::list_posts).wrap(public_limit()))
                        .route(
                            web::post()
                                .to(posts::create_post)
                                .wrap(admin())
                                .wrap(admin_limit()),
                        )
                        .wrap(InputSanitizer::new(trust_proxy)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(posts::get_post).wrap(public_limit()))
                        .route(
                            web::put()
                                .to(posts::update_post)
                                .wrap(admin())
                                .wrap(admin_limit()),
                        )
                        .route(
                            web::delete()
                                .to(posts::delete_post)
                                .wrap(admin())
                                .wrap(admin_limit()),
                        )
                        .wrap(InputSanitizer::new(trust_proxy)),
                )
                .service(
                    web::resource("/{id}/like")
                        .route(web::put().to(engagement::like_post).wrap(public_limit()))
                        .route(web::post().to(engagement::like_post).wrap(public_limit()))
                        .wrap(InputSanitizer::new(trust_proxy)),
                )
                .service(
                    web::resource("/{id}/dislike")
                        .route(web::put().to(engagement::dislike_post).wrap(public_limit()))
                        .wrap(InputSanitizer::new(trust_proxy)),
                )
                .service(
                    web::resource("/{id}/view")
                        .route(web::put().to(engagement::record_view).wrap(public_limit()))
                        .route(web::post().to(engagement::record_view).wrap(public_limit()))
                        .wrap(InputSanitizer::new(trust_proxy)),
                ),
        );
}

/// JSON extractor config: size limit, and malformed bodies reported as validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, req: &HttpRequest| {
            tracing::info!(method = %req.method(), path = %req.path(), error = %err, "Rejected request body");
            error::Error::from(AppError::Validation(err.to_string()))
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::Validation(err.to_string()))
    })
}

pub(crate) fn parse_post_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| {
        tracing::info!(id = %raw, "Invalid post id");
        AppError::InvalidPostId
    })
}

pub(crate) fn post_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        slug: post.slug,
        summary: post.summary,
        tags: post.tags,
        published: post.published,
        views: post.views,
        likes: post.likes,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}
