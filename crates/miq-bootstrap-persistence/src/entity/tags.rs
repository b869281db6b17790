//! `SeaORM` Entity for tags table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::taggings::Entity")]
    Taggings,
}

impl Related<super::taggings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Taggings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
