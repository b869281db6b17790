//! miq-bootstrap Persistence - Database entities and persistence layer
//!
//! This crate provides:
//! - SeaORM entity definitions for the platform tables bootstrap touches
//! - Persistence trait abstractions over alert profiles, enterprises, and servers
//! - An external database backend and an in-memory backend
//! - Settings tree helpers shared by both backends

pub mod entity;
pub mod memory;
pub mod model;
pub mod settings;
pub mod sql;
pub mod traits;

// Re-export sea-orm for convenience
pub use sea_orm;

// Re-export entity prelude
pub use entity::prelude::*;

// Re-export persistence traits
pub use traits::{
    AlertProfilePersistence, EnterprisePersistence, PersistenceService, ServerPersistence,
};

// Re-export SQL backend
pub use sql::ExternalDbPersistService;

// Re-export memory backend
pub use memory::{MemoryPersistService, MemorySeed};

// Re-export model types
pub use model::{AlertProfileSetInfo, AssignmentTarget, EnterpriseInfo, ServerInfo, StorageMode};
