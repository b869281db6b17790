//! `SeaORM` Entity for settings_changes table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "settings_changes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub resource_type: Option<String>,
    pub resource_id: Option<i64>,
    pub key: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub value: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::miq_servers::Entity",
        from = "Column::ResourceId",
        to = "super::miq_servers::Column::Id"
    )]
    MiqServers,
}

impl Related<super::miq_servers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MiqServers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
