//! Target resolution
//!
//! Procedures act on an explicit server and enterprise. The appliance's own
//! server and the enterprise are resolved here, once, before anything runs.
//! A plan only resolves the targets its phases touch, so role augmentation
//! works without any enterprise and alert profile assignment without a
//! server GUID.

use std::path::Path;

use tracing::{debug, info};

use miq_bootstrap_common::{BootstrapError, normalize_guid};
use miq_bootstrap_persistence::{EnterpriseInfo, PersistenceService, ServerInfo};

use crate::bootstrap::BootstrapPlan;

const UNRESOLVED: &str = "unresolved";

/// Records a bootstrap run operates on; `None` for targets nothing asked for
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootstrapContext {
    pub server: Option<ServerInfo>,
    pub enterprise: Option<EnterpriseInfo>,
}

impl BootstrapContext {
    pub fn server_id(&self) -> Option<i64> {
        self.server.as_ref().map(|s| s.id)
    }

    pub fn enterprise_id(&self) -> Option<i64> {
        self.enterprise.as_ref().map(|e| e.id)
    }

    pub fn require_server(&self) -> Result<&ServerInfo, BootstrapError> {
        self.server
            .as_ref()
            .ok_or_else(|| BootstrapError::ServerNotFound(UNRESOLVED.to_string()))
    }

    pub fn require_enterprise(&self) -> Result<&EnterpriseInfo, BootstrapError> {
        self.enterprise
            .as_ref()
            .ok_or_else(|| BootstrapError::EnterpriseNotFound(UNRESOLVED.to_string()))
    }
}

/// Read the appliance GUID from a GUID file (first non-empty line)
pub fn read_guid_file(path: impl AsRef<Path>) -> Result<String, BootstrapError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        BootstrapError::ConfigError(format!(
            "failed to read GUID file {}: {}",
            path.display(),
            e
        ))
    })?;
    let line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| {
            BootstrapError::ConfigError(format!("GUID file {} is empty", path.display()))
        })?;
    normalize_guid(line)
}

/// Resolve the server by GUID
pub async fn resolve_server(
    store: &dyn PersistenceService,
    server_guid: &str,
) -> Result<ServerInfo, BootstrapError> {
    let guid = normalize_guid(server_guid)?;
    store
        .server_find_by_guid(&guid)
        .await?
        .ok_or(BootstrapError::ServerNotFound(guid))
}

/// Resolve the enterprise: an explicit id when given, otherwise the last one
pub async fn resolve_enterprise(
    store: &dyn PersistenceService,
    enterprise_id: Option<i64>,
) -> Result<EnterpriseInfo, BootstrapError> {
    match enterprise_id {
        Some(id) => store
            .enterprise_find_by_id(id)
            .await?
            .ok_or_else(|| BootstrapError::EnterpriseNotFound(id.to_string())),
        None => {
            let enterprise = store
                .enterprise_find_last()
                .await?
                .ok_or_else(|| BootstrapError::EnterpriseNotFound("last".to_string()))?;
            debug!(enterprise_id = enterprise.id, "Using most recently created enterprise");
            Ok(enterprise)
        }
    }
}

/// Resolve both targets of a run
pub async fn resolve_context(
    store: &dyn PersistenceService,
    server_guid: &str,
    enterprise_id: Option<i64>,
) -> Result<BootstrapContext, BootstrapError> {
    let server = resolve_server(store, server_guid).await?;
    let enterprise = resolve_enterprise(store, enterprise_id).await?;

    info!(
        server_id = server.id,
        server_guid = %server.guid,
        enterprise_id = enterprise.id,
        "Resolved bootstrap targets"
    );

    Ok(BootstrapContext {
        server: Some(server),
        enterprise: Some(enterprise),
    })
}

/// Resolve only the targets the plan's phases act on.
///
/// `server_guid` is called only when a selected phase needs the server, so a
/// missing GUID file does not matter to alert profile assignment.
pub async fn resolve_plan_targets<F>(
    store: &dyn PersistenceService,
    plan: &BootstrapPlan,
    server_guid: F,
    enterprise_id: Option<i64>,
) -> Result<BootstrapContext, BootstrapError>
where
    F: FnOnce() -> Result<String, BootstrapError>,
{
    let mut ctx = BootstrapContext::default();
    if plan.needs_server() {
        ctx.server = Some(resolve_server(store, &server_guid()?).await?);
    }
    if plan.needs_enterprise() {
        ctx.enterprise = Some(resolve_enterprise(store, enterprise_id).await?);
    }

    info!(
        server_id = ?ctx.server_id(),
        enterprise_id = ?ctx.enterprise_id(),
        "Resolved bootstrap targets"
    );
    Ok(ctx)
}
