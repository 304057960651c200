//! Post lifecycle: create, list, fetch, update, delete.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{PageRequest, Post, PostDraft, PostFilter, PostPage};
use crate::error::{ConflictKind, DomainError, RepoError};
use crate::ports::PostRepository;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    pub async fn create(&self, draft: PostDraft) -> Result<Post, DomainError> {
        let post = draft.into_post()?;
        self.posts
            .insert(post)
            .await
            .map_err(slug_conflict_or("Failed to create post"))
    }

    pub async fn list(&self, filter: PostFilter, page: PageRequest) -> Result<PostPage, DomainError> {
        let total = self
            .posts
            .count(filter)
            .await
            .map_err(DomainError::store("Failed to count posts"))?;
        let posts = self
            .posts
            .list(filter, page)
            .await
            .map_err(DomainError::store("Failed to fetch posts"))?;

        Ok(PostPage {
            posts,
            page: page.page,
            limit: page.limit,
            total,
        })
    }

    /// Look a post up by id when `identifier` parses as one, by slug otherwise.
    pub async fn get(&self, identifier: &str) -> Result<Post, DomainError> {
        let found = match Uuid::parse_str(identifier) {
            Ok(id) => self.posts.find_by_id(id).await,
            Err(_) => self.posts.find_by_slug(identifier).await,
        }
        .map_err(DomainError::store("Failed to fetch post"))?;

        found.ok_or_else(|| DomainError::post_not_found(identifier))
    }

    pub async fn update(&self, id: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        let existing = self
            .posts
            .find_by_id(id)
            .await
            .map_err(DomainError::store("Failed to fetch post"))?
            .ok_or_else(|| DomainError::post_not_found(id.to_string()))?;

        let updated = draft.apply_to(&existing)?;

        self.posts
            .update_content(&updated)
            .await
            .map_err(slug_conflict_or("Failed to update post"))?
            .ok_or_else(|| DomainError::post_not_found(id.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        match self.posts.delete(id).await {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound) => Err(DomainError::post_not_found(id.to_string())),
            Err(e) => Err(DomainError::store("Failed to delete post")(e)),
        }
    }
}

fn slug_conflict_or(operation: &'static str) -> impl FnOnce(RepoError) -> DomainError {
    move |err| match err {
        RepoError::Constraint(_) => DomainError::Conflict(ConflictKind::SlugTaken),
        other => DomainError::store(operation)(other),
    }
}
