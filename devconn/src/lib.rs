//! Device connectivity library
//!
//! Builds the instructions a device or gateway needs to reach the platform:
//! publish commands per transport, gateway compose files and server
//! certificates, plus device activity reporting.

pub mod activity;
pub mod app;
pub mod cache;
pub mod connectivity;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod utils;
pub mod workers;
