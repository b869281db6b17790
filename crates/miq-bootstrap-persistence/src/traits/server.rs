//! Server persistence trait
//!
//! Defines server lookups and the read/merge/write cycle on server settings.

use async_trait::async_trait;
use serde_json::Value;

use crate::model::ServerInfo;

/// Server record and settings operations
#[async_trait]
pub trait ServerPersistence: Send + Sync {
    /// Find a server by its appliance GUID
    async fn server_find_by_guid(&self, guid: &str) -> anyhow::Result<Option<ServerInfo>>;

    /// Find a server by id
    async fn server_find_by_id(&self, id: i64) -> anyhow::Result<Option<ServerInfo>>;

    /// Effective settings of a server (defaults overlaid with its overrides).
    ///
    /// Returns `None` when the server does not exist.
    async fn server_get_config(&self, server_id: i64) -> anyhow::Result<Option<Value>>;

    /// Apply a partial settings update.
    ///
    /// Only the leaves present in `patch` are written; every other setting is
    /// left as it was. A leaf equal to its default drops the override.
    async fn server_set_config(&self, server_id: i64, patch: &Value) -> anyhow::Result<()>;

    /// Persist the server record itself
    async fn server_save(&self, server: &ServerInfo) -> anyhow::Result<()>;
}
