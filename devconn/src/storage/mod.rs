//! Stores, registry and settings files

pub mod layout;
pub mod registry;
pub mod settings;
pub mod stores;
