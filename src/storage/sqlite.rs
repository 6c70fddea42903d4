//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, OptionalExtension, params};
use crate::model::{Pair, SettingKey, Source, Target};
use crate::{Error, Result};
use super::schema;

/// SQLite-backed store for the source/target relation and settings.
///
/// One store instance wraps one connection; callers construct it explicitly
/// and pass it by reference into whatever needs it. Cascade deletes rely on
/// SQLite's own foreign-key enforcement, switched on per connection.
pub struct SettingsStore {
    conn: Connection,
}

impl SettingsStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize pragmas and schema, then purge legacy empty-path rows
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(schema::CONNECTION_PRAGMAS)?;
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        self.purge_empty_sources()?;
        Ok(())
    }

    /// Delete source rows with an empty path.
    ///
    /// Old databases can carry such rows from cancelled picker dialogs;
    /// they would otherwise generate copy commands with an empty source.
    fn purge_empty_sources(&self) -> Result<()> {
        self.conn.execute("DELETE FROM sources WHERE path = ''", [])?;
        Ok(())
    }

    // ========== Source Operations ==========

    /// Register a source directory.
    ///
    /// The path is resolved to its canonical absolute form. A path that
    /// does not name an existing directory is ignored, as is a duplicate
    /// registration; callers that need to know whether the add took must
    /// re-query [`SettingsStore::list_sources`].
    pub fn add_source(&self, path: &Path) -> Result<()> {
        let Some(resolved) = resolve_dir(path) else {
            tracing::debug!("ignoring source, not an existing directory: {}", path.display());
            return Ok(());
        };
        self.conn.execute(
            "INSERT INTO sources (path) VALUES (?1)",
            params![resolved],
        )?;
        Ok(())
    }

    /// Remove a source and, via the foreign-key cascade, every target it
    /// owns. Removing an unknown path is a no-op.
    pub fn remove_source(&self, path: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sources WHERE path = ?1", params![path])?;
        self.purge_empty_sources()?;
        Ok(())
    }

    // ========== Target Operations ==========

    /// Associate a target directory with a registered source.
    ///
    /// The target path is resolved to its canonical absolute form; a path
    /// that does not name an existing directory is ignored, as is a
    /// duplicate. Naming a source that is not registered is an error, so a
    /// target row can never carry a dangling owner.
    pub fn add_target(&self, source_path: &str, target_path: &Path) -> Result<()> {
        let Some(resolved) = resolve_dir(target_path) else {
            tracing::debug!("ignoring target, not an existing directory: {}", target_path.display());
            return Ok(());
        };
        let source_id = self
            .source_id(source_path)?
            .ok_or_else(|| Error::SourceNotFound(source_path.to_string()))?;
        self.conn.execute(
            "INSERT INTO targets (path, source_id) VALUES (?1, ?2)",
            params![resolved, source_id],
        )?;
        Ok(())
    }

    /// Remove a single target. Removing an unknown path is a no-op.
    pub fn remove_target(&self, path: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM targets WHERE path = ?1", params![path])?;
        self.purge_empty_sources()?;
        Ok(())
    }

    // ========== Queries ==========

    /// All registered sources, in storage order
    pub fn list_sources(&self) -> Result<Vec<Source>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path FROM sources ORDER BY id")?;

        let sources = stmt
            .query_map([], |row| Ok(Source { path: row.get(0)? }))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(sources)
    }

    /// Targets owned by the source with the given stored path, in storage
    /// order. Empty when the source has no targets or does not exist.
    pub fn list_targets(&self, source_path: &str) -> Result<Vec<Target>> {
        let mut stmt = self.conn.prepare(
            "SELECT targets.path, sources.path FROM targets
             JOIN sources ON sources.id = targets.source_id
             WHERE sources.path = ?1 ORDER BY targets.id",
        )?;

        let targets = stmt
            .query_map([source_path], |row| {
                Ok(Target {
                    path: row.get(0)?,
                    source_path: row.get(1)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(targets)
    }

    /// The full relation, one row per (source, target) edge.
    ///
    /// Inner-join semantics: a source with no targets contributes no rows.
    pub fn list_pairs(&self) -> Result<Vec<Pair>> {
        let mut stmt = self.conn.prepare(
            "SELECT sources.path, targets.path FROM sources
             JOIN targets ON sources.id = targets.source_id
             ORDER BY sources.id, targets.id",
        )?;

        let pairs = stmt
            .query_map([], |row| {
                Ok(Pair {
                    source_path: row.get(0)?,
                    target_path: row.get(1)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(pairs)
    }

    /// Helper to look up a source's rowid by stored path
    fn source_id(&self, path: &str) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT id FROM sources WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    // ========== Settings ==========

    /// Upsert a configuration value; a prior value for the key is replaced
    pub fn set_setting(&self, key: SettingKey, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)",
            params![key.as_str(), value],
        )?;
        Ok(())
    }

    /// Get the last-set value for a key, or None if never set
    pub fn get_setting(&self, key: SettingKey) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }
}

/// Resolve a path to canonical absolute form, if it names an existing
/// directory
fn resolve_dir(path: &Path) -> Option<String> {
    let resolved = std::fs::canonicalize(path).ok()?;
    if !resolved.is_dir() {
        return None;
    }
    Some(resolved.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(path: &Path) -> String {
        std::fs::canonicalize(path)
            .unwrap()
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_add_source_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open_in_memory().unwrap();

        store.add_source(dir.path()).unwrap();
        store.add_source(dir.path()).unwrap();

        let sources = store.list_sources().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].path, resolved(dir.path()));
    }

    #[test]
    fn test_add_source_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open_in_memory().unwrap();

        store.add_source(&dir.path().join("does-not-exist")).unwrap();

        assert!(store.list_sources().unwrap().is_empty());
    }

    #[test]
    fn test_add_source_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        let store = SettingsStore::open_in_memory().unwrap();

        store.add_source(&file).unwrap();

        assert!(store.list_sources().unwrap().is_empty());
    }

    #[test]
    fn test_remove_source_cascades_to_targets() {
        let src_a = tempfile::tempdir().unwrap();
        let src_b = tempfile::tempdir().unwrap();
        let tgt_1 = tempfile::tempdir().unwrap();
        let tgt_2 = tempfile::tempdir().unwrap();
        let tgt_b = tempfile::tempdir().unwrap();
        let store = SettingsStore::open_in_memory().unwrap();

        store.add_source(src_a.path()).unwrap();
        store.add_source(src_b.path()).unwrap();
        let a = resolved(src_a.path());
        let b = resolved(src_b.path());
        store.add_target(&a, tgt_1.path()).unwrap();
        store.add_target(&a, tgt_2.path()).unwrap();
        store.add_target(&b, tgt_b.path()).unwrap();

        store.remove_source(&a).unwrap();

        let sources = store.list_sources().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].path, b);
        assert!(store.list_targets(&a).unwrap().is_empty());

        // cascaded targets must not reappear under the surviving source
        let b_targets = store.list_targets(&b).unwrap();
        assert_eq!(b_targets.len(), 1);
        assert_eq!(b_targets[0].path, resolved(tgt_b.path()));
        assert_eq!(b_targets[0].source_path, b);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let store = SettingsStore::open_in_memory().unwrap();
        store.remove_source("/no/such/source").unwrap();
        store.remove_target("/no/such/target").unwrap();
    }

    #[test]
    fn test_add_target_unknown_source_errors() {
        let tgt = tempfile::tempdir().unwrap();
        let store = SettingsStore::open_in_memory().unwrap();

        let err = store.add_target("/never/registered", tgt.path()).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
        assert!(store.list_pairs().unwrap().is_empty());
    }

    #[test]
    fn test_add_target_missing_dir_is_noop() {
        let src = tempfile::tempdir().unwrap();
        let store = SettingsStore::open_in_memory().unwrap();

        store.add_source(src.path()).unwrap();
        let a = resolved(src.path());
        store.add_target(&a, &src.path().join("nope")).unwrap();

        assert!(store.list_targets(&a).unwrap().is_empty());
    }

    #[test]
    fn test_list_pairs_inner_join() {
        let src_a = tempfile::tempdir().unwrap();
        let src_b = tempfile::tempdir().unwrap();
        let tgt = tempfile::tempdir().unwrap();
        let store = SettingsStore::open_in_memory().unwrap();

        store.add_source(src_a.path()).unwrap();
        store.add_source(src_b.path()).unwrap();
        let a = resolved(src_a.path());
        store.add_target(&a, tgt.path()).unwrap();

        // src_b has no targets and must contribute no rows
        let pairs = store.list_pairs().unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].source_path, a);
        assert_eq!(pairs[0].target_path, resolved(tgt.path()));
    }

    #[test]
    fn test_duplicate_target_ignored() {
        let src = tempfile::tempdir().unwrap();
        let tgt = tempfile::tempdir().unwrap();
        let store = SettingsStore::open_in_memory().unwrap();

        store.add_source(src.path()).unwrap();
        let a = resolved(src.path());
        store.add_target(&a, tgt.path()).unwrap();
        store.add_target(&a, tgt.path()).unwrap();

        assert_eq!(store.list_targets(&a).unwrap().len(), 1);
    }

    #[test]
    fn test_setting_last_write_wins() {
        let store = SettingsStore::open_in_memory().unwrap();

        assert_eq!(store.get_setting(SettingKey::OutputScript).unwrap(), None);

        store.set_setting(SettingKey::OutputScript, "one.cmd").unwrap();
        store.set_setting(SettingKey::OutputScript, "two.cmd").unwrap();

        assert_eq!(
            store.get_setting(SettingKey::OutputScript).unwrap().as_deref(),
            Some("two.cmd")
        );
        assert_eq!(store.get_setting(SettingKey::LogFile).unwrap(), None);
    }

    #[test]
    fn test_empty_path_sources_purged() {
        let store = SettingsStore::open_in_memory().unwrap();
        store
            .conn
            .execute("INSERT INTO sources (path) VALUES ('')", [])
            .unwrap();

        // any remove runs the purge
        store.remove_target("/no/such/target").unwrap();

        assert!(store.list_sources().unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("settings.db");
        let src = tempfile::tempdir().unwrap();

        {
            let store = SettingsStore::open(&db).unwrap();
            store.add_source(src.path()).unwrap();
            store.set_setting(SettingKey::LogFile, "backup.log").unwrap();
        }

        let store = SettingsStore::open(&db).unwrap();
        assert_eq!(store.list_sources().unwrap().len(), 1);
        assert_eq!(
            store.get_setting(SettingKey::LogFile).unwrap().as_deref(),
            Some("backup.log")
        );
    }
}
