//! `SeaORM` Entity definitions for the platform tables touched by bootstrap

pub mod prelude;

pub mod miq_enterprises;
pub mod miq_servers;
pub mod miq_sets;
pub mod settings_changes;
pub mod taggings;
pub mod tags;
