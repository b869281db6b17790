//! Read-only view of the bootstrap targets

use serde::Serialize;

use miq_bootstrap_common::{BootstrapError, normalize_guid};
use miq_bootstrap_persistence::{AssignmentTarget, PersistenceService};

use crate::context::BootstrapContext;
use crate::roles::missing_roles;
use crate::server_role::{current_roles, load_server_config};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlertProfileState {
    pub guid: String,
    /// `None` when no set with this GUID exists
    pub profile_id: Option<i64>,
    pub profile_name: Option<String>,
    pub assigned: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BootstrapState {
    pub server_id: i64,
    pub server_guid: String,
    pub enterprise_id: i64,
    /// Raw `server.role` value; `None` when the key is missing or not a string
    pub roles: Option<String>,
    pub missing_roles: Vec<String>,
    pub alert_profiles: Vec<AlertProfileState>,
}

impl BootstrapState {
    /// Whether a run would leave anything to do
    pub fn is_bootstrapped(&self) -> bool {
        self.roles.is_some()
            && self.missing_roles.is_empty()
            && self.alert_profiles.iter().all(|p| p.assigned)
    }
}

/// Report the current roles and the assignment state of each alert profile set.
///
/// Needs both targets resolved.
pub async fn inspect<S: AsRef<str>, R: AsRef<str>>(
    store: &dyn PersistenceService,
    ctx: &BootstrapContext,
    guids: &[S],
    roles: &[R],
) -> Result<BootstrapState, BootstrapError> {
    let server = ctx.require_server()?;
    let enterprise = ctx.require_enterprise()?;
    let config = load_server_config(store, server.id).await?;
    let current = current_roles(&config).ok();
    let missing = match current {
        Some(current) => missing_roles(current, roles),
        None => roles.iter().map(|r| r.as_ref()).collect(),
    };

    let target = AssignmentTarget::enterprise(enterprise.id);
    let mut alert_profiles = Vec::with_capacity(guids.len());
    for raw in guids {
        let guid = normalize_guid(raw.as_ref())?;
        let state = match store.alert_profile_find_by_guid(&guid).await? {
            Some(profile) => {
                let assigned = store
                    .alert_profile_assignments(profile.id)
                    .await?
                    .contains(&target);
                AlertProfileState {
                    guid,
                    profile_id: Some(profile.id),
                    profile_name: Some(profile.name),
                    assigned,
                }
            }
            None => AlertProfileState {
                guid,
                profile_id: None,
                profile_name: None,
                assigned: false,
            },
        };
        alert_profiles.push(state);
    }

    Ok(BootstrapState {
        server_id: server.id,
        server_guid: server.guid.clone(),
        enterprise_id: enterprise.id,
        roles: current.map(str::to_string),
        missing_roles: missing.into_iter().map(str::to_string).collect(),
        alert_profiles,
    })
}
