// In-memory persistence backend
// Seeded from a YAML fixture; used for rehearsal runs and tests

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{AlertProfileSetInfo, AssignmentTarget, EnterpriseInfo, ServerInfo, StorageMode};
use crate::settings;
use crate::traits::{
    AlertProfilePersistence, EnterprisePersistence, PersistenceService, ServerPersistence,
};

/// Alert profile set entry in a seed file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SeedAlertProfileSet {
    #[serde(flatten)]
    pub info: AlertProfileSetInfo,
    /// Enterprise ids the set is already assigned to
    #[serde(default)]
    pub assigned_to_enterprises: Vec<i64>,
}

/// Server entry in a seed file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SeedServer {
    #[serde(flatten)]
    pub info: ServerInfo,
    /// Per-server settings overrides
    #[serde(default)]
    pub settings: Value,
}

/// Contents of a memory store seed file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemorySeed {
    /// Defaults tree every server's overrides are applied to
    #[serde(default)]
    pub defaults: Value,
    #[serde(default)]
    pub enterprises: Vec<EnterpriseInfo>,
    #[serde(default)]
    pub alert_profile_sets: Vec<SeedAlertProfileSet>,
    #[serde(default)]
    pub servers: Vec<SeedServer>,
}

impl MemorySeed {
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read seed file {}: {}", path.display(), e))?;
        Self::from_yaml(&content)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    alert_profile_sets: Vec<AlertProfileSetInfo>,
    assignments: HashMap<i64, Vec<AssignmentTarget>>,
    enterprises: Vec<EnterpriseInfo>,
    servers: Vec<ServerInfo>,
    overrides: HashMap<i64, Value>,
    server_saves: HashMap<i64, u64>,
}

/// Process-local persistence
///
/// Mirrors the external database semantics: idempotent assignments, leaf-level
/// settings overrides on top of a defaults tree, separate server saves.
pub struct MemoryPersistService {
    state: RwLock<MemoryState>,
    defaults: Value,
    read_only: bool,
}

impl Default for MemoryPersistService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPersistService {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            defaults: Value::Object(Map::new()),
            read_only: false,
        }
    }

    /// Create a store populated from a seed
    pub fn from_seed(seed: MemorySeed) -> Self {
        let mut state = MemoryState::default();

        for set in seed.alert_profile_sets {
            let targets = set
                .assigned_to_enterprises
                .into_iter()
                .map(AssignmentTarget::enterprise)
                .collect();
            state.assignments.insert(set.info.id, targets);
            state.alert_profile_sets.push(set.info);
        }
        state.enterprises = seed.enterprises;
        for server in seed.servers {
            if server.settings.is_object() {
                state.overrides.insert(server.info.id, server.settings);
            }
            state.servers.push(server.info);
        }

        let defaults = if seed.defaults.is_object() {
            seed.defaults
        } else {
            Value::Object(Map::new())
        };

        Self {
            state: RwLock::new(state),
            defaults,
            read_only: false,
        }
    }

    /// Reject every write with an error
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn insert_alert_profile_set(&self, set: AlertProfileSetInfo) {
        self.state.write().alert_profile_sets.push(set);
    }

    pub fn insert_enterprise(&self, enterprise: EnterpriseInfo) {
        self.state.write().enterprises.push(enterprise);
    }

    pub fn insert_server(&self, server: ServerInfo, overrides: Value) {
        let mut state = self.state.write();
        if overrides.is_object() {
            state.overrides.insert(server.id, overrides);
        }
        state.servers.push(server);
    }

    /// Number of times a server record has been saved
    pub fn server_save_count(&self, server_id: i64) -> u64 {
        self.state
            .read()
            .server_saves
            .get(&server_id)
            .copied()
            .unwrap_or(0)
    }

    /// Persisted overrides of a server, without defaults applied
    pub fn server_overrides(&self, server_id: i64) -> Option<Value> {
        self.state.read().overrides.get(&server_id).cloned()
    }

    fn ensure_writable(&self) -> anyhow::Result<()> {
        if self.read_only {
            anyhow::bail!("memory store is read-only");
        }
        Ok(())
    }
}

// ============================================================================
// PersistenceService implementation
// ============================================================================

#[async_trait]
impl PersistenceService for MemoryPersistService {
    fn storage_mode(&self) -> StorageMode {
        StorageMode::Memory
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

// ============================================================================
// AlertProfilePersistence implementation
// ============================================================================

#[async_trait]
impl AlertProfilePersistence for MemoryPersistService {
    async fn alert_profile_find_by_guid(
        &self,
        guid: &str,
    ) -> anyhow::Result<Option<AlertProfileSetInfo>> {
        Ok(self
            .state
            .read()
            .alert_profile_sets
            .iter()
            .find(|s| s.guid == guid)
            .cloned())
    }

    async fn alert_profile_assign(
        &self,
        profile_id: i64,
        target: &AssignmentTarget,
    ) -> anyhow::Result<bool> {
        let mut state = self.state.write();
        if !state.alert_profile_sets.iter().any(|s| s.id == profile_id) {
            anyhow::bail!("alert profile set {} does not exist", profile_id);
        }

        let targets = state.assignments.entry(profile_id).or_default();
        if targets.contains(target) {
            return Ok(false);
        }
        self.ensure_writable()?;
        targets.push(*target);
        debug!(profile_id, target = %target, "Recorded alert profile assignment");
        Ok(true)
    }

    async fn alert_profile_assignments(
        &self,
        profile_id: i64,
    ) -> anyhow::Result<Vec<AssignmentTarget>> {
        Ok(self
            .state
            .read()
            .assignments
            .get(&profile_id)
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================================================
// EnterprisePersistence implementation
// ============================================================================

#[async_trait]
impl EnterprisePersistence for MemoryPersistService {
    async fn enterprise_find_last(&self) -> anyhow::Result<Option<EnterpriseInfo>> {
        Ok(self
            .state
            .read()
            .enterprises
            .iter()
            .max_by_key(|e| e.id)
            .cloned())
    }

    async fn enterprise_find_by_id(&self, id: i64) -> anyhow::Result<Option<EnterpriseInfo>> {
        Ok(self
            .state
            .read()
            .enterprises
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }
}

// ============================================================================
// ServerPersistence implementation
// ============================================================================

#[async_trait]
impl ServerPersistence for MemoryPersistService {
    async fn server_find_by_guid(&self, guid: &str) -> anyhow::Result<Option<ServerInfo>> {
        Ok(self
            .state
            .read()
            .servers
            .iter()
            .find(|s| s.guid == guid)
            .cloned())
    }

    async fn server_find_by_id(&self, id: i64) -> anyhow::Result<Option<ServerInfo>> {
        Ok(self
            .state
            .read()
            .servers
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn server_get_config(&self, server_id: i64) -> anyhow::Result<Option<Value>> {
        let state = self.state.read();
        if !state.servers.iter().any(|s| s.id == server_id) {
            return Ok(None);
        }

        let mut effective = self.defaults.clone();
        if let Some(overrides) = state.overrides.get(&server_id) {
            settings::deep_merge(&mut effective, overrides);
        }
        Ok(Some(effective))
    }

    async fn server_set_config(&self, server_id: i64, patch: &Value) -> anyhow::Result<()> {
        self.ensure_writable()?;

        let mut state = self.state.write();
        if !state.servers.iter().any(|s| s.id == server_id) {
            anyhow::bail!("server {} does not exist", server_id);
        }

        let overrides = state
            .overrides
            .entry(server_id)
            .or_insert_with(|| Value::Object(Map::new()));
        for (key, value) in settings::leaf_changes(patch) {
            if settings::value_at(&self.defaults, &key) == Some(&value) {
                settings::remove_at(overrides, &key);
            } else {
                settings::insert_at(overrides, &key, value);
            }
        }
        Ok(())
    }

    async fn server_save(&self, server: &ServerInfo) -> anyhow::Result<()> {
        self.ensure_writable()?;

        let mut state = self.state.write();
        let Some(existing) = state.servers.iter_mut().find(|s| s.id == server.id) else {
            anyhow::bail!("server {} does not exist", server.id);
        };
        *existing = server.clone();
        *state.server_saves.entry(server.id).or_insert(0) += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const SEED: &str = r#"
defaults:
  server:
    role: database_operations,event
    name: EVM
enterprises:
  - id: 1
    name: Enterprise
alert_profile_sets:
  - id: 10
    guid: a16fcf51-e2ae-492d-af37-19de881476ad
    name: Host Default
    assigned_to_enterprises: [1]
  - id: 11
    guid: ff0fb114-be03-4685-bebb-b6ae8f13d7ad
servers:
  - id: 1
    guid: 5e8ff4e2-1ef3-11e6-b8b8-0242ac110002
    name: EVM
    settings:
      server:
        role: automate,reporting
"#;

    fn seeded() -> MemoryPersistService {
        MemoryPersistService::from_seed(MemorySeed::from_yaml(SEED).unwrap())
    }

    #[tokio::test]
    async fn test_seed_loading() {
        let svc = seeded();
        let set = svc
            .alert_profile_find_by_guid("a16fcf51-e2ae-492d-af37-19de881476ad")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(set.id, 10);
        assert_eq!(set.name, "Host Default");
        assert_eq!(
            svc.alert_profile_assignments(10).await.unwrap(),
            vec![AssignmentTarget::enterprise(1)]
        );
        assert!(svc.alert_profile_assignments(11).await.unwrap().is_empty());
        assert_eq!(svc.enterprise_find_last().await.unwrap().unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_seed_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.yml");
        std::fs::write(&path, SEED).unwrap();
        let seed = MemorySeed::from_file(&path).unwrap();
        assert_eq!(seed.servers.len(), 1);
        assert!(MemorySeed::from_file(dir.path().join("missing.yml")).is_err());
    }

    #[tokio::test]
    async fn test_find_last_enterprise_picks_highest_id() {
        let svc = MemoryPersistService::new();
        assert!(svc.enterprise_find_last().await.unwrap().is_none());
        svc.insert_enterprise(EnterpriseInfo {
            id: 3,
            ..Default::default()
        });
        svc.insert_enterprise(EnterpriseInfo {
            id: 1,
            ..Default::default()
        });
        assert_eq!(svc.enterprise_find_last().await.unwrap().unwrap().id, 3);
        assert!(svc.enterprise_find_by_id(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_assign_is_idempotent() {
        let svc = seeded();
        let target = AssignmentTarget::enterprise(1);
        assert!(svc.alert_profile_assign(11, &target).await.unwrap());
        assert!(!svc.alert_profile_assign(11, &target).await.unwrap());
        assert_eq!(svc.alert_profile_assignments(11).await.unwrap(), vec![target]);
    }

    #[tokio::test]
    async fn test_assign_unknown_profile_fails() {
        let svc = seeded();
        let err = svc
            .alert_profile_assign(99, &AssignmentTarget::enterprise(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_get_config_applies_overrides() {
        let svc = seeded();
        let config = svc.server_get_config(1).await.unwrap().unwrap();
        assert_eq!(
            config,
            json!({"server": {"role": "automate,reporting", "name": "EVM"}})
        );
        assert!(svc.server_get_config(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_config_partial_update() {
        let svc = seeded();
        svc.server_set_config(1, &json!({"server": {"role": "x,y"}}))
            .await
            .unwrap();
        let config = svc.server_get_config(1).await.unwrap().unwrap();
        assert_eq!(config, json!({"server": {"role": "x,y", "name": "EVM"}}));
    }

    #[tokio::test]
    async fn test_set_config_to_default_drops_override() {
        let svc = seeded();
        svc.server_set_config(1, &json!({"server": {"role": "database_operations,event"}}))
            .await
            .unwrap();
        assert_eq!(svc.server_overrides(1), Some(json!({})));
        let config = svc.server_get_config(1).await.unwrap().unwrap();
        assert_eq!(config["server"]["role"], json!("database_operations,event"));
    }

    #[tokio::test]
    async fn test_server_save_counts() {
        let svc = seeded();
        let server = svc.server_find_by_id(1).await.unwrap().unwrap();
        svc.server_save(&server).await.unwrap();
        svc.server_save(&server).await.unwrap();
        assert_eq!(svc.server_save_count(1), 2);

        let ghost = ServerInfo {
            id: 5,
            ..Default::default()
        };
        assert!(svc.server_save(&ghost).await.is_err());
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let svc = seeded().with_read_only(true);
        assert!(
            svc.alert_profile_assign(11, &AssignmentTarget::enterprise(1))
                .await
                .is_err()
        );
        assert!(
            svc.server_set_config(1, &json!({"server": {"role": "a"}}))
                .await
                .is_err()
        );
        // an existing assignment needs no write
        assert!(
            !svc.alert_profile_assign(10, &AssignmentTarget::enterprise(1))
                .await
                .unwrap()
        );
        // reads still work
        assert!(svc.server_get_config(1).await.unwrap().is_some());
        assert_eq!(svc.storage_mode(), StorageMode::Memory);
    }
}
