//! End-to-end bootstrap runs against a seeded memory store

use miq_bootstrap_common::{BootstrapError, CU_ROLES, DEFAULT_ALERT_PROFILE_GUIDS};
use miq_bootstrap_core::{
    AssignmentStatus, BootstrapPlan, Phase, PhaseOutcome, inspect, resolve_context,
    resolve_plan_targets, run,
};
use miq_bootstrap_persistence::{
    AlertProfilePersistence, AssignmentTarget, MemoryPersistService, MemorySeed,
    ServerPersistence,
};

const SERVER_GUID: &str = "5e8ff4e2-1ef3-11e6-b8b8-0242ac110002";

fn seed(role: Option<&str>, profiles: &[&str]) -> MemorySeed {
    let role_line = role
        .map(|r| format!("        role: \"{}\"\n", r))
        .unwrap_or_default();
    let profile_lines: String = profiles
        .iter()
        .enumerate()
        .map(|(i, guid)| {
            format!(
                "  - id: {}\n    guid: {}\n    name: Profile {}\n",
                100 + i,
                guid,
                i
            )
        })
        .collect();

    let yaml = format!(
        r#"
defaults:
  server:
    zone: default
    role: "database_operations,event"
  workers:
    worker_base:
      count: 2
enterprises:
  - id: 1
    name: Old Enterprise
  - id: 3
    name: Enterprise
alert_profile_sets:
{profile_lines}servers:
  - id: 1
    guid: {SERVER_GUID}
    name: EVM
    settings:
      server:
        name: EVM
{role_line}"#
    );
    MemorySeed::from_yaml(&yaml).unwrap()
}

fn store(role: Option<&str>) -> MemoryPersistService {
    MemoryPersistService::from_seed(seed(role, &DEFAULT_ALERT_PROFILE_GUIDS))
}

async fn roles_of(store: &MemoryPersistService) -> String {
    let config = store.server_get_config(1).await.unwrap().unwrap();
    config["server"]["role"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_run() {
    let store = store(Some("a,c,b"));
    let ctx = resolve_context(&store, SERVER_GUID, None).await.unwrap();
    assert_eq!(ctx.enterprise_id(), Some(3));

    let report = run(&store, &ctx, &BootstrapPlan::default()).await.unwrap();
    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.server_id, Some(1));
    assert_eq!(report.enterprise_id, Some(3));
    assert_eq!(report.completed[0].phase(), Phase::AlertProfileAssignment);
    assert_eq!(report.completed[1].phase(), Phase::RoleAugmentation);

    assert_eq!(
        roles_of(&store).await,
        "a,b,c,ems_metrics_collector,ems_metrics_coordinator,ems_metrics_processor"
    );
    for id in [100, 101] {
        assert_eq!(
            store.alert_profile_assignments(id).await.unwrap(),
            vec![AssignmentTarget::enterprise(3)]
        );
    }
    assert_eq!(store.server_save_count(1), 1);
}

#[tokio::test]
async fn test_role_from_defaults_is_augmented() {
    let store = store(None);
    let ctx = resolve_context(&store, SERVER_GUID, None).await.unwrap();
    run(&store, &ctx, &BootstrapPlan::default()).await.unwrap();

    assert_eq!(
        roles_of(&store).await,
        "database_operations,ems_metrics_collector,ems_metrics_coordinator,ems_metrics_processor,event"
    );
}

#[tokio::test]
async fn test_only_role_key_is_written() {
    let store = store(Some("event"));
    let ctx = resolve_context(&store, SERVER_GUID, None).await.unwrap();
    let before = store.server_get_config(1).await.unwrap().unwrap();

    run(&store, &ctx, &BootstrapPlan::default()).await.unwrap();

    let after = store.server_get_config(1).await.unwrap().unwrap();
    assert_eq!(before["workers"], after["workers"]);
    assert_eq!(before["server"]["zone"], after["server"]["zone"]);
    assert_eq!(before["server"]["name"], after["server"]["name"]);

    let overrides = store.server_overrides(1).unwrap();
    assert_eq!(
        overrides["server"].as_object().unwrap().len(),
        2,
        "only name and role are overridden"
    );
}

#[tokio::test]
async fn test_rerun_duplicates_roles_but_not_assignments() {
    let store = store(Some("event"));
    let ctx = resolve_context(&store, SERVER_GUID, None).await.unwrap();
    run(&store, &ctx, &BootstrapPlan::default()).await.unwrap();
    let report = run(&store, &ctx, &BootstrapPlan::default()).await.unwrap();

    let PhaseOutcome::AlertProfileAssignment { assignments } = &report.completed[0] else {
        panic!("unexpected first phase");
    };
    assert!(
        assignments
            .iter()
            .all(|a| a.status == AssignmentStatus::AlreadyAssigned)
    );
    assert_eq!(store.alert_profile_assignments(100).await.unwrap().len(), 1);

    let roles = roles_of(&store).await;
    for role in CU_ROLES {
        assert_eq!(roles.split(',').filter(|r| *r == role).count(), 2);
    }
    assert_eq!(store.server_save_count(1), 2);
}

#[tokio::test]
async fn test_whitespace_tokens_survive() {
    let store = store(Some("a, b"));
    let ctx = resolve_context(&store, SERVER_GUID, None).await.unwrap();
    run(&store, &ctx, &BootstrapPlan::default()).await.unwrap();

    assert_eq!(
        roles_of(&store).await,
        " b,a,ems_metrics_collector,ems_metrics_coordinator,ems_metrics_processor"
    );
}

#[tokio::test]
async fn test_missing_profile_stops_before_roles() {
    let store = MemoryPersistService::from_seed(seed(
        Some("event"),
        &[DEFAULT_ALERT_PROFILE_GUIDS[1]],
    ));
    let ctx = resolve_context(&store, SERVER_GUID, None).await.unwrap();

    let failure = run(&store, &ctx, &BootstrapPlan::default())
        .await
        .unwrap_err();
    assert_eq!(failure.phase, Phase::AlertProfileAssignment);
    assert!(failure.completed.is_empty());
    assert!(matches!(
        failure.source,
        BootstrapError::AlertProfileNotFound(ref g) if g == DEFAULT_ALERT_PROFILE_GUIDS[0]
    ));

    assert_eq!(roles_of(&store).await, "event");
    assert_eq!(store.server_save_count(1), 0);
    assert!(store.alert_profile_assignments(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_failure_reports_completed_phase() {
    let seed = MemorySeed::from_yaml(&format!(
        r#"
enterprises:
  - id: 1
    name: Enterprise
alert_profile_sets:
  - id: 100
    guid: {}
    name: Default
  - id: 101
    guid: {}
    name: Default Hosts
servers:
  - id: 1
    guid: {SERVER_GUID}
    settings:
      server:
        zone: default
"#,
        DEFAULT_ALERT_PROFILE_GUIDS[0], DEFAULT_ALERT_PROFILE_GUIDS[1]
    ))
    .unwrap();
    let store = MemoryPersistService::from_seed(seed);
    let ctx = resolve_context(&store, SERVER_GUID, None).await.unwrap();

    let failure = run(&store, &ctx, &BootstrapPlan::default())
        .await
        .unwrap_err();
    assert_eq!(failure.phase, Phase::RoleAugmentation);
    assert!(matches!(failure.source, BootstrapError::MalformedConfig(_)));
    assert_eq!(failure.completed.len(), 1);
    assert_eq!(failure.completed[0].phase(), Phase::AlertProfileAssignment);

    // assignments from the completed phase stay in place
    assert_eq!(store.alert_profile_assignments(100).await.unwrap().len(), 1);
    assert_eq!(store.server_save_count(1), 0);
}

#[tokio::test]
async fn test_write_failure_in_role_phase() {
    let seed = MemorySeed::from_yaml(&format!(
        r#"
enterprises:
  - id: 1
    name: Enterprise
alert_profile_sets:
  - id: 100
    guid: {}
    assigned_to_enterprises: [1]
  - id: 101
    guid: {}
    assigned_to_enterprises: [1]
servers:
  - id: 1
    guid: {SERVER_GUID}
    settings:
      server:
        role: event
"#,
        DEFAULT_ALERT_PROFILE_GUIDS[0], DEFAULT_ALERT_PROFILE_GUIDS[1]
    ))
    .unwrap();
    let store = MemoryPersistService::from_seed(seed).with_read_only(true);
    let ctx = resolve_context(&store, SERVER_GUID, None).await.unwrap();

    let failure = run(&store, &ctx, &BootstrapPlan::default())
        .await
        .unwrap_err();
    assert_eq!(failure.phase, Phase::RoleAugmentation);
    assert!(matches!(failure.source, BootstrapError::Persistence(_)));
    assert_eq!(failure.completed.len(), 1);
    assert_eq!(roles_of(&store).await, "event");
}

#[tokio::test]
async fn test_dry_run_changes_nothing() {
    let store = store(Some("event"));
    let ctx = resolve_context(&store, SERVER_GUID, None).await.unwrap();
    let report = run(&store, &ctx, &BootstrapPlan::default().with_dry_run(true))
        .await
        .unwrap();

    assert!(report.dry_run);
    let PhaseOutcome::RoleAugmentation { change } = &report.completed[1] else {
        panic!("unexpected second phase");
    };
    assert!(!change.applied);
    assert_eq!(roles_of(&store).await, "event");
    assert!(store.alert_profile_assignments(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_single_phase_plan() {
    let store = store(Some("event"));
    let ctx = resolve_context(&store, SERVER_GUID, None).await.unwrap();
    let plan = BootstrapPlan::default().with_phases(vec![Phase::RoleAugmentation]);
    let report = run(&store, &ctx, &plan).await.unwrap();

    assert_eq!(report.completed.len(), 1);
    assert!(store.alert_profile_assignments(100).await.unwrap().is_empty());
    assert_ne!(roles_of(&store).await, "event");
}

#[tokio::test]
async fn test_inspect_reflects_run() {
    let store = store(Some("event"));
    let ctx = resolve_context(&store, SERVER_GUID, None).await.unwrap();
    let before = inspect(&store, &ctx, &DEFAULT_ALERT_PROFILE_GUIDS, &CU_ROLES)
        .await
        .unwrap();
    assert!(!before.is_bootstrapped());

    run(&store, &ctx, &BootstrapPlan::default()).await.unwrap();

    let after = inspect(&store, &ctx, &DEFAULT_ALERT_PROFILE_GUIDS, &CU_ROLES)
        .await
        .unwrap();
    assert!(after.is_bootstrapped());
}

#[tokio::test]
async fn test_role_phase_without_enterprise() {
    let yaml = format!(
        r#"
servers:
  - id: 1
    guid: {SERVER_GUID}
    settings:
      server:
        role: event
"#
    );
    let store = MemoryPersistService::from_seed(MemorySeed::from_yaml(&yaml).unwrap());
    let plan = BootstrapPlan::default().with_phases(vec![Phase::RoleAugmentation]);
    let ctx = resolve_plan_targets(&store, &plan, || Ok(SERVER_GUID.to_string()), None)
        .await
        .unwrap();

    let report = run(&store, &ctx, &plan).await.unwrap();
    assert_eq!(report.server_id, Some(1));
    assert_eq!(report.enterprise_id, None);
    assert_eq!(
        roles_of(&store).await,
        "ems_metrics_collector,ems_metrics_coordinator,ems_metrics_processor,event"
    );
}

#[tokio::test]
async fn test_assignment_phase_without_server_guid() {
    let store = store(Some("event"));
    let plan = BootstrapPlan::default().with_phases(vec![Phase::AlertProfileAssignment]);
    let ctx = resolve_plan_targets(
        &store,
        &plan,
        || Err(BootstrapError::ConfigError("GUID file missing".to_string())),
        None,
    )
    .await
    .unwrap();

    let report = run(&store, &ctx, &plan).await.unwrap();
    assert_eq!(report.server_id, None);
    assert_eq!(report.enterprise_id, Some(3));
    assert_eq!(
        store.alert_profile_assignments(100).await.unwrap(),
        vec![AssignmentTarget::enterprise(3)]
    );
    assert_eq!(roles_of(&store).await, "event");
}
