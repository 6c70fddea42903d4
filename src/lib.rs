//! # Mirrorplan - Backup mirroring planner
//!
//! Keeps a persistent mapping of backup source directories to one or more
//! mirror target directories, renders that mapping into a robocopy batch
//! script, and summarizes the unified run log into a categorized report.
//!
//! Mirrorplan provides:
//! - SQLite-backed source/target relation with cascade deletes
//! - Singleton configuration values (script output path, unified log path)
//! - Script synthesis: one mirror-copy command per (source, target) pair
//! - Log classification: groups unified-log lines into a report file

pub mod model;
pub mod report;
pub mod script;
pub mod storage;

// Re-exports for convenient access
pub use model::{Pair, SettingKey, Source, Target};
pub use storage::SettingsStore;

/// Result type alias for Mirrorplan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Mirrorplan operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No source registered at: {0}")]
    SourceNotFound(String),

    #[error("Required setting not configured: {0}")]
    MissingSetting(SettingKey),

    #[error("Log decode error: {0}")]
    Decode(String),
}
