//! SQL-based persistence backend (PostgreSQL via SeaORM)
//!
//! Reads and writes the platform's own tables:
//! - alert profile sets live in `miq_sets` (`set_type = 'MiqAlertSet'`)
//! - assignments are tags under `/miq_alert_set/assigned_to/...`, linked via `taggings`
//! - server settings overrides are `settings_changes` rows keyed by slash path

use async_trait::async_trait;
use sea_orm::{prelude::Expr, *};
use serde_json::Value;
use tracing::debug;

use miq_bootstrap_common::{MODEL_MIQ_ALERT_SET, MODEL_MIQ_SERVER};

use crate::entity::{miq_enterprises, miq_servers, miq_sets, settings_changes, taggings, tags};
use crate::model::*;
use crate::settings;
use crate::traits::*;

/// External database persistence service
///
/// Wraps a SeaORM `DatabaseConnection` and implements all persistence traits
/// by direct queries against the platform schema.
pub struct ExternalDbPersistService {
    db: DatabaseConnection,
    defaults: Value,
}

impl ExternalDbPersistService {
    /// Create a new ExternalDbPersistService with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            defaults: Value::Object(Default::default()),
        }
    }

    /// Use `defaults` as the base tree that settings overrides are applied to
    pub fn with_defaults(mut self, defaults: Value) -> Self {
        self.defaults = defaults;
        self
    }
}

#[inline]
fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn alert_set_entity_to_info(model: miq_sets::Model) -> AlertProfileSetInfo {
    AlertProfileSetInfo {
        id: model.id,
        guid: model.guid.unwrap_or_default(),
        name: model.name.unwrap_or_default(),
        description: model.description.unwrap_or_default(),
        mode: model.mode.unwrap_or_default(),
    }
}

fn enterprise_entity_to_info(model: miq_enterprises::Model) -> EnterpriseInfo {
    EnterpriseInfo {
        id: model.id,
        name: model.name.unwrap_or_default(),
        description: model.description.unwrap_or_default(),
    }
}

fn server_entity_to_info(model: miq_servers::Model) -> ServerInfo {
    ServerInfo {
        id: model.id,
        guid: model.guid.unwrap_or_default(),
        name: model.name.unwrap_or_default(),
        status: model.status.unwrap_or_default(),
        zone_id: model.zone_id,
    }
}

// ============================================================================
// PersistenceService implementation
// ============================================================================

#[async_trait]
impl PersistenceService for ExternalDbPersistService {
    fn storage_mode(&self) -> StorageMode {
        StorageMode::ExternalDb
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        miq_servers::Entity::find()
            .select_only()
            .column_as(Expr::cust("1"), "health")
            .into_tuple::<i32>()
            .one(&self.db)
            .await?;
        Ok(())
    }
}

// ============================================================================
// AlertProfilePersistence implementation
// ============================================================================

#[async_trait]
impl AlertProfilePersistence for ExternalDbPersistService {
    async fn alert_profile_find_by_guid(
        &self,
        guid: &str,
    ) -> anyhow::Result<Option<AlertProfileSetInfo>> {
        let model = miq_sets::Entity::find()
            .filter(miq_sets::Column::SetType.eq(MODEL_MIQ_ALERT_SET))
            .filter(miq_sets::Column::Guid.eq(guid))
            .one(&self.db)
            .await?;
        Ok(model.map(alert_set_entity_to_info))
    }

    async fn alert_profile_assign(
        &self,
        profile_id: i64,
        target: &AssignmentTarget,
    ) -> anyhow::Result<bool> {
        let txn = self.db.begin().await?;

        if miq_sets::Entity::find_by_id(profile_id)
            .one(&txn)
            .await?
            .is_none()
        {
            anyhow::bail!("alert profile set {} does not exist", profile_id);
        }

        let tag_name = target.tag_name();
        let tag = match tags::Entity::find()
            .filter(tags::Column::Name.eq(tag_name.as_str()))
            .one(&txn)
            .await?
        {
            Some(tag) => tag,
            None => {
                tags::ActiveModel {
                    name: Set(Some(tag_name.clone())),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        let existing = taggings::Entity::find()
            .filter(taggings::Column::TaggableType.eq(MODEL_MIQ_ALERT_SET))
            .filter(taggings::Column::TaggableId.eq(profile_id))
            .filter(taggings::Column::TagId.eq(tag.id))
            .one(&txn)
            .await?;

        let created = if existing.is_some() {
            false
        } else {
            taggings::ActiveModel {
                taggable_id: Set(Some(profile_id)),
                taggable_type: Set(Some(MODEL_MIQ_ALERT_SET.to_string())),
                tag_id: Set(Some(tag.id)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            true
        };

        txn.commit().await?;

        debug!(profile_id, tag = %tag_name, created, "Recorded alert profile assignment");
        Ok(created)
    }

    async fn alert_profile_assignments(
        &self,
        profile_id: i64,
    ) -> anyhow::Result<Vec<AssignmentTarget>> {
        let tag_ids: Vec<i64> = taggings::Entity::find()
            .select_only()
            .column(taggings::Column::TagId)
            .filter(taggings::Column::TaggableType.eq(MODEL_MIQ_ALERT_SET))
            .filter(taggings::Column::TaggableId.eq(profile_id))
            .into_tuple::<Option<i64>>()
            .all(&self.db)
            .await?
            .into_iter()
            .flatten()
            .collect();

        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let names = tags::Entity::find()
            .select_only()
            .column(tags::Column::Name)
            .filter(tags::Column::Id.is_in(tag_ids))
            .order_by_asc(tags::Column::Id)
            .into_tuple::<Option<String>>()
            .all(&self.db)
            .await?;

        Ok(names
            .into_iter()
            .flatten()
            .filter_map(|name| AssignmentTarget::from_tag_name(&name))
            .collect())
    }
}

// ============================================================================
// EnterprisePersistence implementation
// ============================================================================

#[async_trait]
impl EnterprisePersistence for ExternalDbPersistService {
    async fn enterprise_find_last(&self) -> anyhow::Result<Option<EnterpriseInfo>> {
        let model = miq_enterprises::Entity::find()
            .order_by_desc(miq_enterprises::Column::Id)
            .one(&self.db)
            .await?;
        Ok(model.map(enterprise_entity_to_info))
    }

    async fn enterprise_find_by_id(&self, id: i64) -> anyhow::Result<Option<EnterpriseInfo>> {
        let model = miq_enterprises::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(enterprise_entity_to_info))
    }
}

// ============================================================================
// ServerPersistence implementation
// ============================================================================

#[async_trait]
impl ServerPersistence for ExternalDbPersistService {
    async fn server_find_by_guid(&self, guid: &str) -> anyhow::Result<Option<ServerInfo>> {
        let model = miq_servers::Entity::find()
            .filter(miq_servers::Column::Guid.eq(guid))
            .one(&self.db)
            .await?;
        Ok(model.map(server_entity_to_info))
    }

    async fn server_find_by_id(&self, id: i64) -> anyhow::Result<Option<ServerInfo>> {
        let model = miq_servers::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(server_entity_to_info))
    }

    async fn server_get_config(&self, server_id: i64) -> anyhow::Result<Option<Value>> {
        if self.server_find_by_id(server_id).await?.is_none() {
            return Ok(None);
        }

        let rows = settings_changes::Entity::find()
            .filter(settings_changes::Column::ResourceType.eq(MODEL_MIQ_SERVER))
            .filter(settings_changes::Column::ResourceId.eq(server_id))
            .order_by_asc(settings_changes::Column::Id)
            .all(&self.db)
            .await?;

        let mut changes = Vec::with_capacity(rows.len());
        for row in rows {
            let (Some(key), Some(raw)) = (row.key, row.value) else {
                continue;
            };
            changes.push((key, settings::decode_value(&raw)?));
        }

        Ok(Some(settings::effective_settings(&self.defaults, changes)))
    }

    async fn server_set_config(&self, server_id: i64, patch: &Value) -> anyhow::Result<()> {
        let txn = self.db.begin().await?;

        if miq_servers::Entity::find_by_id(server_id)
            .one(&txn)
            .await?
            .is_none()
        {
            anyhow::bail!("server {} does not exist", server_id);
        }

        let now = chrono::Utc::now().naive_utc();

        for (key, value) in settings::leaf_changes(patch) {
            let existing = settings_changes::Entity::find()
                .filter(settings_changes::Column::ResourceType.eq(MODEL_MIQ_SERVER))
                .filter(settings_changes::Column::ResourceId.eq(server_id))
                .filter(settings_changes::Column::Key.eq(key.as_str()))
                .one(&txn)
                .await?;
            let is_default = settings::value_at(&self.defaults, &key) == Some(&value);

            match (existing, is_default) {
                (Some(row), true) => {
                    settings_changes::Entity::delete_by_id(row.id)
                        .exec(&txn)
                        .await?;
                    debug!(server_id, key = %key, "Dropped settings override equal to default");
                }
                (None, true) => {}
                (Some(row), false) => {
                    let mut active: settings_changes::ActiveModel = row.into();
                    active.value = Set(Some(settings::encode_value(&value)?));
                    active.updated_at = Set(Some(now));
                    active.update(&txn).await?;
                }
                (None, false) => {
                    settings_changes::ActiveModel {
                        resource_type: Set(Some(MODEL_MIQ_SERVER.to_string())),
                        resource_id: Set(Some(server_id)),
                        key: Set(Some(key.clone())),
                        value: Set(Some(settings::encode_value(&value)?)),
                        created_at: Set(Some(now)),
                        updated_at: Set(Some(now)),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                }
            }
        }

        txn.commit().await?;
        Ok(())
    }

    async fn server_save(&self, server: &ServerInfo) -> anyhow::Result<()> {
        miq_servers::ActiveModel {
            id: Unchanged(server.id),
            name: Set(non_empty(&server.name)),
            status: Set(non_empty(&server.status)),
            zone_id: Set(server.zone_id),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }
}
