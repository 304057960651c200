//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub summary: String,
    /// JSON array of tag strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub published: bool,
    pub views: i64,
    pub likes: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post_like::Entity")]
    PostLike,
    #[sea_orm(has_many = "super::post_view::Entity")]
    PostView,
}

impl Related<super::post_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostLike.def()
    }
}

impl Related<super::post_view::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostView.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for inkwell_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            content: model.content,
            slug: model.slug,
            summary: model.summary,
            tags: serde_json::from_value(model.tags).unwrap_or_default(),
            published: model.published,
            views: model.views,
            likes: model.likes,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<inkwell_core::domain::Post> for ActiveModel {
    fn from(post: inkwell_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            title: Set(post.title),
            content: Set(post.content),
            slug: Set(post.slug),
            summary: Set(post.summary),
            tags: Set(Json::from(post.tags)),
            published: Set(post.published),
            views: Set(post.views),
            likes: Set(post.likes),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}

/// Only the editable columns are set; counters and `created_at` stay `NotSet`
/// so an update leaves them alone.
pub fn content_changes(post: &inkwell_core::domain::Post) -> ActiveModel {
    ActiveModel {
        id: Set(post.id),
        title: Set(post.title.clone()),
        content: Set(post.content.clone()),
        slug: Set(post.slug.clone()),
        summary: Set(post.summary.clone()),
        tags: Set(Json::from(post.tags.clone())),
        published: Set(post.published),
        updated_at: Set(post.updated_at.into()),
        ..Default::default()
    }
}
