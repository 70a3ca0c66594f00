//! In-memory caches

pub mod certs;
