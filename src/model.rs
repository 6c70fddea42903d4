//! Typed records for the source/target relation and the settings table.
//!
//! The store never hands out bare strings or tuples; every query returns
//! one of these records:
//! - `Source`: a directory whose contents are to be mirrored
//! - `Target`: a directory receiving a mirror of one source's contents
//! - `Pair`: one (source, target) edge of the relation, in generation order

use serde::{Deserialize, Serialize};
use std::fmt;

/// Singleton configuration keys recognized by the settings store.
///
/// The storage keys are kept byte-compatible with legacy settings
/// databases, so an existing `settings.db` keeps working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Where the generated batch script is written
    OutputScript,
    /// The unified log file the generated script writes to and analyzes
    LogFile,
}

impl SettingKey {
    /// Get the storage key for this setting
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::OutputScript => "output_location",
            SettingKey::LogFile => "logfile_location",
        }
    }

    /// Get all setting keys
    pub fn all() -> &'static [SettingKey] {
        &[SettingKey::OutputScript, SettingKey::LogFile]
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered backup source directory.
///
/// The path is the canonical absolute form of the directory as it existed
/// when registered, and is the source's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub path: String,
}

/// A mirror target directory owned by exactly one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub path: String,
    /// Stored path of the owning source
    pub source_path: String,
}

/// One (source, target) edge of the relation.
///
/// `list_pairs` yields these in storage order; the script generator emits
/// one copy command per pair in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub source_path: String,
    pub target_path: String,
}
