//! HTTP API models for the device connectivity service

pub mod models;
