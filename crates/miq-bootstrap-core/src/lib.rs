//! miq-bootstrap Core - appliance bootstrap procedures
//!
//! This crate provides:
//! - Target resolution (server and enterprise)
//! - Alert profile assignment
//! - Server role augmentation
//! - Run orchestration with per-phase reporting
//! - A read-only inspection of the bootstrap state

pub mod alert_profile;
pub mod bootstrap;
pub mod context;
pub mod inspect;
pub mod roles;
pub mod server_role;

pub use alert_profile::{AssignmentOutcome, AssignmentStatus, assign_alert_profiles};
pub use bootstrap::{BootstrapFailure, BootstrapPlan, BootstrapReport, Phase, PhaseOutcome, run};
pub use context::{BootstrapContext, read_guid_file, resolve_context, resolve_plan_targets};
pub use inspect::{AlertProfileState, BootstrapState, inspect};
pub use roles::{augment_roles, split_roles};
pub use server_role::{RoleChange, enable_server_roles};
