//! Store construction and command execution

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use miq_bootstrap_common::BootstrapError;
use miq_bootstrap_core::{
    BootstrapFailure, BootstrapReport, BootstrapState, PhaseOutcome, inspect, resolve_context,
    resolve_plan_targets, run,
};
use miq_bootstrap_persistence::{
    ExternalDbPersistService, MemoryPersistService, MemorySeed, PersistenceService, StorageMode,
};

use crate::config::{Command, Configuration};

/// Open the configured storage backend and check that it answers
pub async fn open_store(
    configuration: &Configuration,
) -> anyhow::Result<Arc<dyn PersistenceService>> {
    let storage_mode = configuration.storage_mode()?;
    info!("Persistence mode: {}", storage_mode);

    let store: Arc<dyn PersistenceService> = match storage_mode {
        StorageMode::ExternalDb => {
            if configuration.read_only() {
                warn!("storage.read_only only applies to the memory backend, ignoring");
            }
            let db = configuration.database_connection().await?;
            let defaults = configuration.settings_defaults()?;
            Arc::new(ExternalDbPersistService::new(db).with_defaults(defaults))
        }
        StorageMode::Memory => {
            let path = configuration.seed_file().ok_or_else(|| {
                BootstrapError::ConfigError("memory storage requires storage.seed_file".to_string())
            })?;
            info!("Loading memory store seed from {}", path);
            let store = MemoryPersistService::from_seed(MemorySeed::from_file(&path)?)
                .with_read_only(configuration.read_only());
            Arc::new(store)
        }
    };

    store.health_check().await?;
    Ok(store)
}

/// What a command produced
#[derive(Debug)]
pub enum Execution {
    Completed(BootstrapReport),
    Failed(BootstrapFailure),
    Inspected(BootstrapState),
}

impl Execution {
    pub fn is_success(&self) -> bool {
        !matches!(self, Execution::Failed(_))
    }
}

/// Resolve the targets and run the configured command.
///
/// Only the targets of the selected phases are resolved: `enable-roles` needs
/// no enterprise and `assign-alert-profiles` never reads the server GUID.
/// Errors before any phase starts (configuration, target resolution) are
/// returned as `Err`; phase failures come back as `Execution::Failed`.
pub async fn execute(
    configuration: &Configuration,
    store: &dyn PersistenceService,
) -> anyhow::Result<Execution> {
    let plan = configuration.plan();

    if configuration.command == Command::Show {
        let server_guid = configuration.server_guid()?;
        let ctx = resolve_context(store, &server_guid, configuration.enterprise_id()).await?;
        let state = inspect(
            store,
            &ctx,
            plan.alert_profile_guids.as_slice(),
            plan.roles.as_slice(),
        )
        .await?;
        return Ok(Execution::Inspected(state));
    }

    let ctx = resolve_plan_targets(
        store,
        &plan,
        || configuration.server_guid(),
        configuration.enterprise_id(),
    )
    .await?;

    info!(
        server_id = ?ctx.server_id(),
        enterprise_id = ?ctx.enterprise_id(),
        dry_run = plan.dry_run,
        phases = ?plan.phases,
        "Starting bootstrap"
    );

    match run(store, &ctx, &plan).await {
        Ok(report) => {
            info!("Bootstrap completed");
            Ok(Execution::Completed(report))
        }
        Err(failure) => {
            error!(
                phase = %failure.phase,
                completed = failure.completed.len(),
                "Bootstrap stopped: {}",
                failure.source
            );
            Ok(Execution::Failed(failure))
        }
    }
}

/// Failure entry of the printed summary
#[derive(Debug, Serialize)]
struct FailureSummary<'a> {
    phase: String,
    code: i32,
    error: String,
    completed: &'a [PhaseOutcome],
}

/// Render the execution as pretty JSON for stdout
pub fn render(execution: &Execution) -> anyhow::Result<String> {
    let rendered = match execution {
        Execution::Completed(report) => serde_json::to_string_pretty(report)?,
        Execution::Inspected(state) => serde_json::to_string_pretty(state)?,
        Execution::Failed(failure) => serde_json::to_string_pretty(&FailureSummary {
            phase: failure.phase.to_string(),
            code: failure.source.code().code,
            error: failure.source.to_string(),
            completed: &failure.completed,
        })?,
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use miq_bootstrap_core::Phase;

    use super::*;

    #[test]
    fn test_render_failure() {
        let failure = BootstrapFailure {
            phase: Phase::RoleAugmentation,
            completed: Vec::new(),
            source: BootstrapError::MalformedConfig("missing key 'server.role'".to_string()),
        };
        let execution = Execution::Failed(failure);
        assert!(!execution.is_success());

        let value: serde_json::Value =
            serde_json::from_str(&render(&execution).unwrap()).unwrap();
        assert_eq!(value["phase"], "role_augmentation");
        assert_eq!(value["code"], 20007);
        assert!(value["completed"].as_array().unwrap().is_empty());
    }
}
