//! Alert profile persistence trait

use async_trait::async_trait;

use crate::model::{AlertProfileSetInfo, AssignmentTarget};

/// Alert profile set lookups and assignments
#[async_trait]
pub trait AlertProfilePersistence: Send + Sync {
    /// Find an alert profile set by exact GUID
    async fn alert_profile_find_by_guid(
        &self,
        guid: &str,
    ) -> anyhow::Result<Option<AlertProfileSetInfo>>;

    /// Assign an alert profile set to a target object.
    ///
    /// Returns `true` when a new assignment was recorded and `false` when the
    /// target was already assigned.
    async fn alert_profile_assign(
        &self,
        profile_id: i64,
        target: &AssignmentTarget,
    ) -> anyhow::Result<bool>;

    /// List the objects an alert profile set is assigned to
    async fn alert_profile_assignments(
        &self,
        profile_id: i64,
    ) -> anyhow::Result<Vec<AssignmentTarget>>;
}
