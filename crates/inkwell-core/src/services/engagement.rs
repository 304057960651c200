//! Engagement ledger - likes, dislikes and views.
//!
//! Like status per (post, identity) is a two-state machine: Unliked -> Liked on
//! like, Liked -> Unliked on dislike. Counters are changed only through the
//! store's atomic increment operations.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{LikePolicy, Post, PostLike, PostView};
use crate::error::{ConflictKind, DomainError, RepoError};
use crate::ports::{LikeRepository, PostRepository, Task, TaskOutcome, TaskQueue, ViewRepository};

/// Counter value after a like or dislike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub likes: i64,
    /// False when the call was a no-op (idempotent duplicate like, dislike at zero).
    pub changed: bool,
}

pub struct EngagementLedger {
    posts: Arc<dyn PostRepository>,
    likes: Arc<dyn LikeRepository>,
    views: Arc<dyn ViewRepository>,
    tasks: Arc<dyn TaskQueue>,
    policy: LikePolicy,
}

impl EngagementLedger {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        likes: Arc<dyn LikeRepository>,
        views: Arc<dyn ViewRepository>,
        tasks: Arc<dyn TaskQueue>,
        policy: LikePolicy,
    ) -> Self {
        Self {
            posts,
            likes,
            views,
            tasks,
            policy,
        }
    }

    pub fn policy(&self) -> LikePolicy {
        self.policy
    }

    /// Unliked -> Liked.
    ///
    /// The existence pre-check is not atomic with the insert; the store's
    /// uniqueness constraint on (post, identity) decides a lost race, which is
    /// then treated exactly like a pre-check hit.
    pub async fn like(&self, post_id: Uuid, identity: &str) -> Result<LikeOutcome, DomainError> {
        self.require_post(post_id).await?;

        let existing = self
            .likes
            .find_by_post_and_identity(post_id, identity)
            .await
            .map_err(DomainError::store("Failed to fetch like"))?;
        if existing.is_some() {
            return self.duplicate_like(post_id).await;
        }

        match self.likes.insert(PostLike::new(post_id, identity)).await {
            Ok(_) => {}
            Err(RepoError::Constraint(_)) => return self.duplicate_like(post_id).await,
            Err(e) => return Err(DomainError::store("Failed to record like")(e)),
        }

        match self.posts.increment_likes(post_id).await {
            Ok(true) => {}
            Ok(false) => {
                self.release_like(post_id, identity).await;
                return Err(DomainError::post_not_found(post_id.to_string()));
            }
            Err(e) => {
                self.release_like(post_id, identity).await;
                return Err(DomainError::store("Failed to update like count")(e));
            }
        }

        Ok(LikeOutcome {
            likes: self.current_likes(post_id).await?,
            changed: true,
        })
    }

    /// Liked -> Unliked, or a no-op on Unliked.
    ///
    /// The counter is decremented floored at zero whether or not this identity
    /// held a like record; a dislike at zero succeeds and reports zero.
    pub async fn dislike(&self, post_id: Uuid, identity: &str) -> Result<LikeOutcome, DomainError> {
        self.require_post(post_id).await?;

        let removed = self
            .likes
            .delete_by_post_and_identity(post_id, identity)
            .await
            .map_err(DomainError::store("Failed to remove like"))?;
        let decremented = self
            .posts
            .decrement_likes(post_id)
            .await
            .map_err(DomainError::store("Failed to update like count"))?;

        Ok(LikeOutcome {
            likes: self.current_likes(post_id).await?,
            changed: removed || decremented,
        })
    }

    /// Queue a view for a post that exists and return the projected view count.
    ///
    /// The view is persisted by a background worker; callers must poll the store,
    /// not this return value, to observe it.
    pub async fn record_view(
        &self,
        post_id: Uuid,
        identity: &str,
        user_agent: &str,
    ) -> Result<i64, DomainError> {
        let post = self.require_post(post_id).await?;

        let task = Task::RecordView(PostView::new(post_id, identity, user_agent));
        match self.tasks.submit(task) {
            Ok(()) => Ok(post.views + 1),
            Err(e) => {
                tracing::warn!(post_id = %post_id, error = %e, "View dropped, task queue unavailable");
                Ok(post.views)
            }
        }
    }

    /// Persist a view record and bump the counter. Runs on a background worker.
    pub async fn apply_view(&self, view: PostView) -> Result<(), DomainError> {
        let post_id = view.post_id;
        self.views
            .insert(view)
            .await
            .map_err(DomainError::store("Failed to record view"))?;

        let matched = self
            .posts
            .increment_views(post_id)
            .await
            .map_err(DomainError::store("Failed to update view count"))?;
        if !matched {
            return Err(DomainError::post_not_found(post_id.to_string()));
        }
        Ok(())
    }

    /// Task handler entry point for the worker pool.
    pub async fn run_task(&self, task: Task) -> TaskOutcome {
        match task {
            Task::RecordView(view) => match self.apply_view(view).await {
                Ok(()) => TaskOutcome::Done,
                Err(e) => TaskOutcome::Failed(e.to_string()),
            },
        }
    }

    async fn require_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await
            .map_err(DomainError::store("Failed to fetch post"))?
            .ok_or_else(|| DomainError::post_not_found(post_id.to_string()))
    }

    async fn current_likes(&self, post_id: Uuid) -> Result<i64, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await
            .map_err(DomainError::store("Failed to fetch updated post"))?
            .map(|post| post.likes)
            .ok_or_else(|| DomainError::post_not_found(post_id.to_string()))
    }

    async fn duplicate_like(&self, post_id: Uuid) -> Result<LikeOutcome, DomainError> {
        match self.policy {
            LikePolicy::RejectDuplicate => Err(DomainError::Conflict(ConflictKind::AlreadyLiked)),
            LikePolicy::Idempotent => Ok(LikeOutcome {
                likes: self.current_likes(post_id).await?,
                changed: false,
            }),
        }
    }

    /// Best-effort removal of a like whose counter increment did not land.
    async fn release_like(&self, post_id: Uuid, identity: &str) {
        if let Err(e) = self.likes.delete_by_post_and_identity(post_id, identity).await {
            tracing::error!(
                post_id = %post_id,
                error = %e,
                "Failed to release like record after counter update failure"
            );
        }
    }
}
