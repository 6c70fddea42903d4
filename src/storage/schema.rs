//! Database schema definitions

/// SQL to create the config table.
/// At most one row per key; re-setting a key replaces the prior value.
pub const CREATE_CONFIG_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS config (
    key TEXT,
    value TEXT,
    UNIQUE (key) ON CONFLICT REPLACE
)
"#;

/// SQL to create the sources table.
/// Duplicate paths are silently ignored on insert.
pub const CREATE_SOURCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sources (
    id INTEGER PRIMARY KEY,
    path TEXT,
    UNIQUE (path) ON CONFLICT IGNORE
)
"#;

/// SQL to create the targets table.
/// Every target belongs to exactly one source; deleting a source cascades
/// to its targets. Requires foreign_keys to be switched on per connection.
pub const CREATE_TARGETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS targets (
    id INTEGER PRIMARY KEY,
    path TEXT,
    source_id INTEGER NOT NULL,
    UNIQUE (path) ON CONFLICT IGNORE,
    FOREIGN KEY (source_id) REFERENCES sources(id) ON DELETE CASCADE
)
"#;

/// Per-connection pragmas. Foreign-key enforcement is off by default in
/// SQLite and the cascade semantics depend on it.
pub const CONNECTION_PRAGMAS: &str = r#"
PRAGMA foreign_keys = ON;
PRAGMA recursive_triggers = ON;
"#;

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_CONFIG_TABLE,
        CREATE_SOURCES_TABLE,
        CREATE_TARGETS_TABLE,
    ]
}
