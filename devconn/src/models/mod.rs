//! Domain models

pub mod credentials;
pub mod device;
pub mod ids;
pub mod profile;
