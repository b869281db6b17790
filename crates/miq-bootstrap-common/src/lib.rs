//! miq-bootstrap Common - Shared types, constants, and utilities
//!
//! This crate provides the foundational pieces used across all miq-bootstrap crates:
//! - The `BootstrapError` taxonomy and report error codes
//! - Well-known alert profile GUIDs and Capacity & Utilization role names
//! - GUID and settings-key helpers

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{BootstrapError, ErrorCode};
pub use utils::{normalize_guid, settings_key, settings_path};

/// Alert profile sets attached to the enterprise by a default run
pub const DEFAULT_ALERT_PROFILE_GUIDS: [&str; 2] = [
    "a16fcf51-e2ae-492d-af37-19de881476ad",
    "ff0fb114-be03-4685-bebb-b6ae8f13d7ad",
];

/// Capacity & Utilization server roles
pub const ROLE_METRICS_COLLECTOR: &str = "ems_metrics_collector";
pub const ROLE_METRICS_COORDINATOR: &str = "ems_metrics_coordinator";
pub const ROLE_METRICS_PROCESSOR: &str = "ems_metrics_processor";

/// Roles appended to the server role list by a default run
pub const CU_ROLES: [&str; 3] = [
    ROLE_METRICS_COLLECTOR,
    ROLE_METRICS_COORDINATOR,
    ROLE_METRICS_PROCESSOR,
];

/// Dotted settings path holding the comma-separated server role list
pub const SERVER_ROLE_PATH: &str = "server.role";

/// Separator between role names in the server role list
pub const ROLE_SEPARATOR: &str = ",";

/// Model names used for resource typing and assignment tags
pub const MODEL_MIQ_SERVER: &str = "MiqServer";
pub const MODEL_MIQ_ALERT_SET: &str = "MiqAlertSet";
pub const MODEL_MIQ_ENTERPRISE: &str = "miq_enterprise";

/// Tag namespace under which alert profile assignments are recorded
pub const ALERT_SET_TAG_NAMESPACE: &str = "/miq_alert_set";

/// Kinds of objects an alert profile set can be assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssignmentKind {
    #[default]
    Enterprise,
}

impl AssignmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentKind::Enterprise => MODEL_MIQ_ENTERPRISE,
        }
    }
}

impl std::fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AssignmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            MODEL_MIQ_ENTERPRISE => Ok(AssignmentKind::Enterprise),
            _ => Err(format!("Invalid assignment kind: {}", s)),
        }
    }
}
