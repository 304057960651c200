//! Post CRUD handlers.

use actix_web::{HttpResponse, web};

use inkwell_core::domain::{PageRequest, PostDraft, PostFilter};
use inkwell_shared::dto::{ListPostsQuery, MessageResponse, PostListResponse, PostRequest};

use super::{parse_post_id, post_response};
use crate::middleware::AppResult;
use crate::state::AppState;

fn draft(body: PostRequest) -> PostDraft {
    PostDraft {
        title: body.title,
        content: body.content,
        slug: body.slug,
        summary: body.summary,
        tags: body.tags,
        published: body.published,
    }
}

/// GET /api/v1/posts
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let filter = PostFilter::from_query(query.published.as_deref());
    let page = PageRequest::from_query(query.page.as_deref(), query.limit.as_deref());

    let result = state.posts.list(filter, page).await?;

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: result.posts.into_iter().map(post_response).collect(),
        page: result.page,
        limit: result.limit,
        total: result.total,
    }))
}

/// POST /api/v1/posts
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let post = state.posts.create(draft(body.into_inner())).await?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "Post created");

    Ok(HttpResponse::Created().json(post_response(post)))
}

/// GET /api/v1/posts/{id} - `id` may also be a slug.
pub async fn get_post(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let post = state.posts.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// PUT /api/v1/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path.into_inner())?;
    let post = state.posts.update(id, draft(body.into_inner())).await?;
    tracing::info!(post_id = %post.id, "Post updated");

    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path.into_inner())?;
    state.posts.delete(id).await?;
    tracing::info!(post_id = %id, "Post deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}
