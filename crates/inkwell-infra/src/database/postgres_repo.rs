//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait,
};
use uuid::Uuid;

use inkwell_core::domain::{PageRequest, Post, PostFilter, PostLike};
use inkwell_core::error::RepoError;
use inkwell_core::ports::{LikeRepository, PostRepository, ViewRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_like::{self, Entity as PostLikeEntity};
use super::entity::post_view::{self, Entity as PostViewEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL like record repository.
pub type PostgresLikeRepository = PostgresBaseRepository<PostLikeEntity>;

/// PostgreSQL view record repository.
pub type PostgresViewRepository = PostgresBaseRepository<PostViewEntity>;

impl PostgresPostRepository {
    /// Apply `delta` to a counter column in one statement. `floor` adds a
    /// `column > 0` guard so the value never goes negative.
    async fn bump(
        &self,
        id: Uuid,
        column: post::Column,
        delta: i64,
        floor: bool,
    ) -> Result<bool, RepoError> {
        let result = PostEntity::update_many()
            .col_expr(column, Expr::col(column).add(delta))
            .filter(post::Column::Id.eq(id))
            .apply_if(floor.then_some(0i64), |query, zero| {
                query.filter(column.gt(zero))
            })
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self, filter: PostFilter, page: PageRequest) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .apply_if(filter.published, |query, published| {
                query.filter(post::Column::Published.eq(published))
            })
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: PostFilter) -> Result<u64, RepoError> {
        PostEntity::find()
            .apply_if(filter.published, |query, published| {
                query.filter(post::Column::Published.eq(published))
            })
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    async fn update_content(&self, post: &Post) -> Result<Option<Post>, RepoError> {
        match post::content_changes(post).update(self.db.as_ref()).await {
            Ok(model) => Ok(Some(model.into())),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(map_db_err(e)),
        }
    }

    async fn increment_views(&self, id: Uuid) -> Result<bool, RepoError> {
        self.bump(id, post::Column::Views, 1, false).await
    }

    async fn increment_likes(&self, id: Uuid) -> Result<bool, RepoError> {
        self.bump(id, post::Column::Likes, 1, false).await
    }

    async fn decrement_likes(&self, id: Uuid) -> Result<bool, RepoError> {
        self.bump(id, post::Column::Likes, -1, true).await
    }
}

#[async_trait]
impl LikeRepository for PostgresLikeRepository {
    async fn find_by_post_and_identity(
        &self,
        post_id: Uuid,
        ip_address: &str,
    ) -> Result<Option<PostLike>, RepoError> {
        let result = PostLikeEntity::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::IpAddress.eq(ip_address))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn delete_by_post_and_identity(
        &self,
        post_id: Uuid,
        ip_address: &str,
    ) -> Result<bool, RepoError> {
        let result = PostLikeEntity::delete_many()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::IpAddress.eq(ip_address))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl ViewRepository for PostgresViewRepository {
    async fn count_by_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        PostViewEntity::find()
            .filter(post_view::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }
}
