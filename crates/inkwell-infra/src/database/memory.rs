//! In-memory repositories - used when no database is configured.
//!
//! Each repository holds its records behind an async RwLock. Every mutation,
//! including the counter updates, happens under a single write lock, which
//! makes it atomic with respect to other callers. Data is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use inkwell_core::domain::{PageRequest, Post, PostFilter, PostLike, PostView};
use inkwell_core::error::RepoError;
use inkwell_core::ports::{BaseRepository, LikeRepository, PostRepository, ViewRepository};

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slug_taken(posts: &HashMap<Uuid, Post>, slug: &str, except: Uuid) -> bool {
    posts.values().any(|p| p.slug == slug && p.id != except)
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("posts_pkey".to_string()));
        }
        if slug_taken(&posts, &post.slug, post.id) {
            return Err(RepoError::Constraint("posts_slug_key".to_string()));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self
            .posts
            .read()
            .await
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn list(&self, filter: PostFilter, page: PageRequest) -> Result<Vec<Post>, RepoError> {
        let posts = self.posts.read().await;
        let mut matching: Vec<&Post> = posts.values().filter(|p| filter.matches(p)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: PostFilter) -> Result<u64, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn update_content(&self, post: &Post) -> Result<Option<Post>, RepoError> {
        let mut posts = self.posts.write().await;
        if slug_taken(&posts, &post.slug, post.id) {
            return Err(RepoError::Constraint("posts_slug_key".to_string()));
        }
        let Some(stored) = posts.get_mut(&post.id) else {
            return Ok(None);
        };

        stored.title = post.title.clone();
        stored.content = post.content.clone();
        stored.slug = post.slug.clone();
        stored.summary = post.summary.clone();
        stored.tags = post.tags.clone();
        stored.published = post.published;
        stored.updated_at = post.updated_at;

        Ok(Some(stored.clone()))
    }

    async fn increment_views(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut posts = self.posts.write().await;
        Ok(posts.get_mut(&id).map(|p| p.views += 1).is_some())
    }

    async fn increment_likes(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut posts = self.posts.write().await;
        Ok(posts.get_mut(&id).map(|p| p.likes += 1).is_some())
    }

    async fn decrement_likes(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut posts = self.posts.write().await;
        match posts.get_mut(&id) {
            Some(post) if post.likes > 0 => {
                post.likes -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryLikeRepository {
    likes: RwLock<HashMap<Uuid, PostLike>>,
}

impl InMemoryLikeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<PostLike, Uuid> for InMemoryLikeRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostLike>, RepoError> {
        Ok(self.likes.read().await.get(&id).cloned())
    }

    async fn insert(&self, like: PostLike) -> Result<PostLike, RepoError> {
        let mut likes = self.likes.write().await;
        let duplicate = likes
            .values()
            .any(|l| l.post_id == like.post_id && l.ip_address == like.ip_address);
        if duplicate || likes.contains_key(&like.id) {
            return Err(RepoError::Constraint("idx_post_likes_post_ip".to_string()));
        }
        likes.insert(like.id, like.clone());
        Ok(like)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.likes
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl LikeRepository for InMemoryLikeRepository {
    async fn find_by_post_and_identity(
        &self,
        post_id: Uuid,
        ip_address: &str,
    ) -> Result<Option<PostLike>, RepoError> {
        Ok(self
            .likes
            .read()
            .await
            .values()
            .find(|l| l.post_id == post_id && l.ip_address == ip_address)
            .cloned())
    }

    async fn delete_by_post_and_identity(
        &self,
        post_id: Uuid,
        ip_address: &str,
    ) -> Result<bool, RepoError> {
        let mut likes = self.likes.write().await;
        let before = likes.len();
        likes.retain(|_, l| !(l.post_id == post_id && l.ip_address == ip_address));
        Ok(likes.len() < before)
    }
}

#[derive(Default)]
pub struct InMemoryViewRepository {
    views: RwLock<HashMap<Uuid, PostView>>,
}

impl InMemoryViewRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<PostView, Uuid> for InMemoryViewRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostView>, RepoError> {
        Ok(self.views.read().await.get(&id).cloned())
    }

    async fn insert(&self, view: PostView) -> Result<PostView, RepoError> {
        let mut views = self.views.write().await;
        if views.contains_key(&view.id) {
            return Err(RepoError::Constraint("post_views_pkey".to_string()));
        }
        views.insert(view.id, view.clone());
        Ok(view)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.views
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl ViewRepository for InMemoryViewRepository {
    async fn count_by_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        Ok(self
            .views
            .read()
            .await
            .values()
            .filter(|v| v.post_id == post_id)
            .count() as u64)
    }
}
