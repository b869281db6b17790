//! Server role augmentation
//!
//! Read the server's effective settings, append roles to `server.role`, write
//! the new list back as a partial settings update, then save the server record.
//! The settings write and the record save are separate writes.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use miq_bootstrap_common::{BootstrapError, SERVER_ROLE_PATH};
use miq_bootstrap_persistence::{PersistenceService, settings};

use crate::roles::{augment_roles, missing_roles};

/// Role list before and after augmentation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoleChange {
    pub server_id: i64,
    pub before: String,
    pub after: String,
    /// Requested roles that were not already enabled
    pub added: Vec<String>,
    /// Whether the new list was written
    pub applied: bool,
}

/// Extract the role list from a settings tree
pub fn current_roles(config: &Value) -> Result<&str, BootstrapError> {
    match settings::lookup(config, SERVER_ROLE_PATH) {
        Some(Value::String(roles)) => Ok(roles.as_str()),
        Some(other) => Err(BootstrapError::MalformedConfig(format!(
            "'{}' is not a string: {}",
            SERVER_ROLE_PATH, other
        ))),
        None => Err(BootstrapError::MalformedConfig(format!(
            "missing key '{}'",
            SERVER_ROLE_PATH
        ))),
    }
}

/// Read the server's effective settings
pub async fn load_server_config(
    store: &dyn PersistenceService,
    server_id: i64,
) -> Result<Value, BootstrapError> {
    store
        .server_get_config(server_id)
        .await?
        .ok_or_else(|| BootstrapError::ServerNotFound(server_id.to_string()))
}

/// Append `roles` to the server's role list and persist it.
///
/// With `dry_run` the new list is computed and returned but nothing is written.
pub async fn enable_server_roles<S: AsRef<str>>(
    store: &dyn PersistenceService,
    server_id: i64,
    roles: &[S],
    dry_run: bool,
) -> Result<RoleChange, BootstrapError> {
    let server = store
        .server_find_by_id(server_id)
        .await?
        .ok_or_else(|| BootstrapError::ServerNotFound(server_id.to_string()))?;
    let config = load_server_config(store, server_id).await?;

    let before = current_roles(&config)?;
    let after = augment_roles(before, roles);
    let added = missing_roles(before, roles)
        .into_iter()
        .map(str::to_string)
        .collect();
    debug!(server_id, before = %before, after = %after, "Computed server role list");

    let change = RoleChange {
        server_id,
        before: before.to_string(),
        after,
        added,
        applied: !dry_run,
    };

    if dry_run {
        info!(server_id, roles = %change.after, "Dry run, server roles not written");
        return Ok(change);
    }

    let patch = settings::nest(SERVER_ROLE_PATH, Value::String(change.after.clone()));
    store.server_set_config(server_id, &patch).await?;
    store.server_save(&server).await?;

    info!(server_id, roles = %change.after, "Server roles updated");
    Ok(change)
}
