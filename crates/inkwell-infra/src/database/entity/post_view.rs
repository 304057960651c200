//! View record entity.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post_views")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub ip_address: String,
    #[sea_orm(column_type = "Text")]
    pub user_agent: String,
    pub viewed_at: DateTimeWithTimeZone,
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

impl From<Model> for inkwell_core::domain::PostView {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            viewed_at: model.viewed_at.into(),
        }
    }
}

impl From<inkwell_core::domain::PostView> for ActiveModel {
    fn from(view: inkwell_core::domain::PostView) -> Self {
        Self {
            id: Set(view.id),
            post_id: Set(view.post_id),
            ip_address: Set(view.ip_address),
            user_agent: Set(view.user_agent),
            viewed_at: Set(view.viewed_at.into()),
        }
    }
}
