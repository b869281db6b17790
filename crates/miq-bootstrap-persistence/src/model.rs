//! Domain model types for the persistence abstraction layer
//!
//! These types are used as return values from the persistence traits,
//! decoupled from specific storage backends.

use serde::{Deserialize, Serialize};

use miq_bootstrap_common::{ALERT_SET_TAG_NAMESPACE, AssignmentKind};

/// Alert profile set (a named collection of alert definitions)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertProfileSetInfo {
    pub id: i64,
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Target model the profile's alerts evaluate, e.g. `Vm` or `Host`
    #[serde(default)]
    pub mode: String,
}

/// Top-level enterprise record
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterpriseInfo {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Management server instance
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub id: i64,
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub zone_id: Option<i64>,
}

/// Object an alert profile set is assigned to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssignmentTarget {
    pub kind: AssignmentKind,
    pub id: i64,
}

impl AssignmentTarget {
    pub fn enterprise(id: i64) -> Self {
        Self {
            kind: AssignmentKind::Enterprise,
            id,
        }
    }

    /// Tag recording this assignment, e.g. `/miq_alert_set/assigned_to/miq_enterprise/id/1`
    pub fn tag_name(&self) -> String {
        format!(
            "{}/assigned_to/{}/id/{}",
            ALERT_SET_TAG_NAMESPACE, self.kind, self.id
        )
    }

    /// Parse an assignment tag; returns `None` for unrelated tags
    pub fn from_tag_name(name: &str) -> Option<Self> {
        let rest = name
            .strip_prefix(ALERT_SET_TAG_NAMESPACE)?
            .strip_prefix("/assigned_to/")?;
        let (kind, id) = rest.split_once("/id/")?;
        Some(Self {
            kind: kind.parse().ok()?,
            id: id.parse().ok()?,
        })
    }
}

impl std::fmt::Display for AssignmentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Storage mode for the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageMode {
    /// The platform's PostgreSQL database via SeaORM
    ExternalDb,
    /// Process-local store seeded from a fixture file
    Memory,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::ExternalDb => write!(f, "external_db"),
            StorageMode::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "external_db" => Ok(StorageMode::ExternalDb),
            "memory" => Ok(StorageMode::Memory),
            _ => Err(format!("Invalid storage mode: {}", s)),
        }
    }
}
