//! Persistence traits for the storage abstraction layer
//!
//! This module defines the persistence traits the bootstrap procedures run
//! against. Backends: the platform's external database (PostgreSQL via SeaORM)
//! and a process-local memory store.

pub mod alert_profile;
pub mod enterprise;
pub mod server;

pub use alert_profile::AlertProfilePersistence;
pub use enterprise::EnterprisePersistence;
pub use server::ServerPersistence;

use async_trait::async_trait;

use crate::model::StorageMode;

/// Unified persistence service trait
///
/// This is the main interface for all storage operations. Implementations
/// dispatch to the appropriate storage backend based on the configured mode.
#[async_trait]
pub trait PersistenceService:
    AlertProfilePersistence + EnterprisePersistence + ServerPersistence + Send + Sync
{
    /// Get the current storage mode
    fn storage_mode(&self) -> StorageMode;

    /// Health check for the storage backend
    async fn health_check(&self) -> anyhow::Result<()>;
}
