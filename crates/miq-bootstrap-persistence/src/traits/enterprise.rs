//! Enterprise persistence trait

use async_trait::async_trait;

use crate::model::EnterpriseInfo;

#[async_trait]
pub trait EnterprisePersistence: Send + Sync {
    /// Find the most recently created enterprise (highest id)
    async fn enterprise_find_last(&self) -> anyhow::Result<Option<EnterpriseInfo>>;

    async fn enterprise_find_by_id(&self, id: i64) -> anyhow::Result<Option<EnterpriseInfo>>;
}
