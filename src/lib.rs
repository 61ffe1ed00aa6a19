// src/lib.rs
pub mod alerts;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod models;
pub mod poller;
pub mod schema;
pub mod source;
