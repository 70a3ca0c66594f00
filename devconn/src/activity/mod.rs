//! Device activity reporting strategies

pub mod manager;
pub mod strategy;
