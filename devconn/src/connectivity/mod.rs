//! Device connectivity: publish commands, gateway compose files and server certificates

pub mod cert;
pub mod commands;
pub mod compose;
pub mod info;
pub mod options;
pub mod protocol;
pub mod resource;
pub mod service;
