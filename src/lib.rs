//! linkvault: bookmark link ingestion with URL normalization, Open Graph
//! scraping with fallback, per-user folder storage, and tag reconciliation.
//!
//! This library crate exposes all modules for use by the server binary and integration tests.

pub mod app;
pub mod database;
pub mod http;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
