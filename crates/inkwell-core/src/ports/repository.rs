use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{PageRequest, Post, PostFilter, PostLike, PostView};
use crate::error::RepoError;

/// Generic repository trait defining the operations every stored record supports.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Uniqueness violations surface as `RepoError::Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. `RepoError::NotFound` when nothing matched.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Post repository.
///
/// Counter updates are single atomic statements against the store, never
/// read-modify-write cycles in the application.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Newest first.
    async fn list(&self, filter: PostFilter, page: PageRequest) -> Result<Vec<Post>, RepoError>;

    async fn count(&self, filter: PostFilter) -> Result<u64, RepoError>;

    /// Overwrite the editable fields (title, content, slug, summary, tags, published,
    /// updated_at). Counters and `created_at` are left alone. `None` if the post is gone.
    async fn update_content(&self, post: &Post) -> Result<Option<Post>, RepoError>;

    /// Add one view. Returns false if no post matched.
    async fn increment_views(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Add one like. Returns false if no post matched.
    async fn increment_likes(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Remove one like unless the counter is already zero.
    /// Returns false if nothing changed (missing post or counter at zero).
    async fn decrement_likes(&self, id: Uuid) -> Result<bool, RepoError>;
}

/// Like record repository. The store enforces uniqueness of (post_id, ip_address).
#[async_trait]
pub trait LikeRepository: BaseRepository<PostLike, Uuid> {
    async fn find_by_post_and_identity(
        &self,
        post_id: Uuid,
        ip_address: &str,
    ) -> Result<Option<PostLike>, RepoError>;

    /// Returns true if a record was removed.
    async fn delete_by_post_and_identity(
        &self,
        post_id: Uuid,
        ip_address: &str,
    ) -> Result<bool, RepoError>;
}

/// View record repository.
#[async_trait]
pub trait ViewRepository: BaseRepository<PostView, Uuid> {
    async fn count_by_post(&self, post_id: Uuid) -> Result<u64, RepoError>;
}
