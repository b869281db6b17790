//! `SeaORM` Entity for miq_servers table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "miq_servers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub guid: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub zone_id: Option<i64>,
    pub started_on: Option<DateTime>,
    pub last_heartbeat: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::settings_changes::Entity")]
    SettingsChanges,
}

impl Related<super::settings_changes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SettingsChanges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
