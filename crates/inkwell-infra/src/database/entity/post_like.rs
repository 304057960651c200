//! Like record entity. Unique on (post_id, ip_address), see `schema`.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post_likes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub ip_address: String,
    pub liked_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for inkwell_core::domain::PostLike {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            ip_address: model.ip_address,
            liked_at: model.liked_at.into(),
        }
    }
}

impl From<inkwell_core::domain::PostLike> for ActiveModel {
    fn from(like: inkwell_core::domain::PostLike) -> Self {
        Self {
            id: Set(like.id),
            post_id: Set(like.post_id),
            ip_address: Set(like.ip_address),
            liked_at: Set(like.liked_at.into()),
        }
    }
}
