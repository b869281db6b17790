//! Alert profile assignment
//!
//! Attaches alert profile sets, looked up by GUID, to the enterprise. GUIDs are
//! processed in order and the first missing set stops the phase.

use serde::Serialize;
use tracing::{info, warn};

use miq_bootstrap_common::{BootstrapError, normalize_guid};
use miq_bootstrap_persistence::{AssignmentTarget, PersistenceService};

/// What happened to one alert profile set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    AlreadyAssigned,
    WouldAssign,
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::AlreadyAssigned => "already assigned",
            AssignmentStatus::WouldAssign => "would assign",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssignmentOutcome {
    pub guid: String,
    pub profile_id: i64,
    pub profile_name: String,
    pub enterprise_id: i64,
    pub status: AssignmentStatus,
}

/// Assign each alert profile set to the enterprise.
///
/// Fails with `AlertProfileNotFound` on the first GUID without a matching set;
/// GUIDs after it are not looked up.
pub async fn assign_alert_profiles<S: AsRef<str>>(
    store: &dyn PersistenceService,
    guids: &[S],
    enterprise_id: i64,
    dry_run: bool,
) -> Result<Vec<AssignmentOutcome>, BootstrapError> {
    if store.enterprise_find_by_id(enterprise_id).await?.is_none() {
        return Err(BootstrapError::EnterpriseNotFound(enterprise_id.to_string()));
    }

    let target = AssignmentTarget::enterprise(enterprise_id);
    let mut outcomes = Vec::with_capacity(guids.len());

    for raw in guids {
        let guid = normalize_guid(raw.as_ref())?;
        let Some(profile) = store.alert_profile_find_by_guid(&guid).await? else {
            warn!(guid = %guid, "Alert profile set not found");
            return Err(BootstrapError::AlertProfileNotFound(guid));
        };

        let status = if dry_run {
            let assigned = store.alert_profile_assignments(profile.id).await?;
            if assigned.contains(&target) {
                AssignmentStatus::AlreadyAssigned
            } else {
                AssignmentStatus::WouldAssign
            }
        } else if store.alert_profile_assign(profile.id, &target).await? {
            AssignmentStatus::Assigned
        } else {
            AssignmentStatus::AlreadyAssigned
        };

        info!(
            guid = %guid,
            profile = %profile.name,
            target = %target,
            status = %status,
            "Alert profile set processed"
        );

        outcomes.push(AssignmentOutcome {
            guid,
            profile_id: profile.id,
            profile_name: profile.name,
            enterprise_id,
            status,
        });
    }

    Ok(outcomes)
}
