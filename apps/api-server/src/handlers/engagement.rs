//! Like, dislike and view handlers.

use actix_web::{HttpRequest, HttpResponse, http::header, web};

use inkwell_core::domain::LikePolicy;
use inkwell_shared::dto::{LikeResponse, ViewResponse};

use super::parse_post_id;
use crate::middleware::{AppResult, ClientIp};
use crate::state::AppState;

/// PUT|POST /api/v1/posts/{id}/like
pub async fn like_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
    ClientIp(identity): ClientIp,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path.into_inner())?;
    let outcome = state.engagement.like(id, &identity).await?;

    let message = if !outcome.changed && state.engagement.policy() == LikePolicy::Idempotent {
        "Post already liked"
    } else {
        "Post liked successfully"
    };
    tracing::debug!(post_id = %id, client = %identity, likes = outcome.likes, changed = outcome.changed, "Like");

    Ok(HttpResponse::Ok().json(LikeResponse {
        message: message.to_string(),
        likes: outcome.likes,
    }))
}

/// PUT /api/v1/posts/{id}/dislike
pub async fn dislike_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
    ClientIp(identity): ClientIp,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path.into_inner())?;
    let outcome = state.engagement.dislike(id, &identity).await?;
    tracing::debug!(post_id = %id, client = %identity, likes = outcome.likes, "Dislike");

    Ok(HttpResponse::Ok().json(LikeResponse {
        message: "Post disliked successfully".to_string(),
        likes: outcome.likes,
    }))
}

/// PUT|POST /api/v1/posts/{id}/view
///
/// The view is persisted in the background; `views` in the response is the
/// projected count.
pub async fn record_view(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    ClientIp(identity): ClientIp,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path.into_inner())?;
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let views = state.engagement.record_view(id, &identity, user_agent).await?;

    Ok(HttpResponse::Ok().json(ViewResponse {
        message: "Post view recorded successfully".to_string(),
        views,
    }))
}
