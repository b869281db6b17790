//! Bootstrap run orchestration
//!
//! A run executes its phases in a fixed order: alert profile assignment, then
//! server role augmentation. The first failing phase ends the run; phases that
//! already completed are reported alongside the error and are not rolled back.

use serde::Serialize;
use tracing::{error, info};

use miq_bootstrap_common::{BootstrapError, CU_ROLES, DEFAULT_ALERT_PROFILE_GUIDS};
use miq_bootstrap_persistence::PersistenceService;

use crate::alert_profile::{AssignmentOutcome, assign_alert_profiles};
use crate::context::BootstrapContext;
use crate::server_role::{RoleChange, enable_server_roles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AlertProfileAssignment,
    RoleAugmentation,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 2] = [Phase::AlertProfileAssignment, Phase::RoleAugmentation];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::AlertProfileAssignment => "alert_profile_assignment",
            Phase::RoleAugmentation => "role_augmentation",
        }
    }

    /// Whether the phase writes the appliance server's settings
    pub fn needs_server(self) -> bool {
        matches!(self, Phase::RoleAugmentation)
    }

    /// Whether the phase assigns to the enterprise
    pub fn needs_enterprise(self) -> bool {
        matches!(self, Phase::AlertProfileAssignment)
    }

    /// Progress message logged when the phase starts
    pub fn banner(self) -> &'static str {
        match self {
            Phase::AlertProfileAssignment => "Assigning alert profiles to the Enterprise",
            Phase::RoleAugmentation => "Enabling C&U roles",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a run should do
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapPlan {
    pub alert_profile_guids: Vec<String>,
    pub roles: Vec<String>,
    pub phases: Vec<Phase>,
    pub dry_run: bool,
}

impl Default for BootstrapPlan {
    fn default() -> Self {
        Self {
            alert_profile_guids: DEFAULT_ALERT_PROFILE_GUIDS
                .iter()
                .map(|g| g.to_string())
                .collect(),
            roles: CU_ROLES.iter().map(|r| r.to_string()).collect(),
            phases: Phase::ALL.to_vec(),
            dry_run: false,
        }
    }
}

impl BootstrapPlan {
    pub fn with_phases(mut self, phases: Vec<Phase>) -> Self {
        self.phases = phases;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn includes(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }

    pub fn needs_server(&self) -> bool {
        self.phases.iter().any(|p| p.needs_server())
    }

    pub fn needs_enterprise(&self) -> bool {
        self.phases.iter().any(|p| p.needs_enterprise())
    }
}

/// Result of one completed phase
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseOutcome {
    AlertProfileAssignment { assignments: Vec<AssignmentOutcome> },
    RoleAugmentation { change: RoleChange },
}

impl PhaseOutcome {
    pub fn phase(&self) -> Phase {
        match self {
            PhaseOutcome::AlertProfileAssignment { .. } => Phase::AlertProfileAssignment,
            PhaseOutcome::RoleAugmentation { .. } => Phase::RoleAugmentation,
        }
    }
}

/// Report of a run where every phase succeeded
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    /// `None` when no selected phase touched the server
    pub server_id: Option<i64>,
    /// `None` when no selected phase touched the enterprise
    pub enterprise_id: Option<i64>,
    pub dry_run: bool,
    pub completed: Vec<PhaseOutcome>,
}

/// A run stopped by a failing phase
#[derive(Debug, thiserror::Error)]
#[error("{phase} failed: {source}")]
pub struct BootstrapFailure {
    pub phase: Phase,
    /// Phases that finished before the failure
    pub completed: Vec<PhaseOutcome>,
    #[source]
    pub source: BootstrapError,
}

async fn run_phase(
    store: &dyn PersistenceService,
    ctx: &BootstrapContext,
    plan: &BootstrapPlan,
    phase: Phase,
) -> Result<PhaseOutcome, BootstrapError> {
    match phase {
        Phase::AlertProfileAssignment => {
            let enterprise = ctx.require_enterprise()?;
            let assignments = assign_alert_profiles(
                store,
                plan.alert_profile_guids.as_slice(),
                enterprise.id,
                plan.dry_run,
            )
            .await?;
            Ok(PhaseOutcome::AlertProfileAssignment { assignments })
        }
        Phase::RoleAugmentation => {
            let server = ctx.require_server()?;
            let change =
                enable_server_roles(store, server.id, plan.roles.as_slice(), plan.dry_run).await?;
            Ok(PhaseOutcome::RoleAugmentation { change })
        }
    }
}

/// Execute the plan's phases against the resolved targets.
///
/// A selected phase whose target is missing from `ctx` fails like any other
/// phase error.
pub async fn run(
    store: &dyn PersistenceService,
    ctx: &BootstrapContext,
    plan: &BootstrapPlan,
) -> Result<BootstrapReport, BootstrapFailure> {
    let mut completed = Vec::with_capacity(plan.phases.len());

    for phase in Phase::ALL.into_iter().filter(|p| plan.includes(*p)) {
        info!("{}", phase.banner());

        match run_phase(store, ctx, plan, phase).await {
            Ok(outcome) => completed.push(outcome),
            Err(source) => {
                error!(phase = %phase, code = %source.code(), "Bootstrap phase failed: {}", source);
                return Err(BootstrapFailure {
                    phase,
                    completed,
                    source,
                });
            }
        }
    }

    Ok(BootstrapReport {
        server_id: ctx.server_id(),
        enterprise_id: ctx.enterprise_id(),
        dry_run: plan.dry_run,
        completed,
    })
}
