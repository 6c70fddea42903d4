//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - config(key, value) - singleton settings, replace on duplicate key
//! - sources(id, path) - registered backup sources, ignore on duplicate path
//! - targets(id, path, source_id) - mirror targets, cascade on source delete

pub mod schema;
pub mod sqlite;

pub use sqlite::SettingsStore;
