//! `SeaORM` Entity prelude

pub use super::miq_enterprises::Entity as MiqEnterprises;
pub use super::miq_servers::Entity as MiqServers;
pub use super::miq_sets::Entity as MiqSets;
pub use super::settings_changes::Entity as SettingsChanges;
pub use super::taggings::Entity as Taggings;
pub use super::tags::Entity as Tags;
