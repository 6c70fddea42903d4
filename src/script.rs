//! Script generation - renders the relation into a robocopy batch script.
//!
//! Each (source, target) pair becomes one ROBOCOPY invocation. All
//! invocations write into a single unified log: the first one truncates it,
//! every later one appends, so one report can cover the whole run. A
//! trailing command re-invokes this binary to classify the log once the
//! copies have finished.

use std::path::{Path, PathBuf};

use crate::model::{Pair, SettingKey};
use crate::storage::SettingsStore;
use crate::{Error, Result};

/// Flag set shared by every generated copy command: copy data, attributes,
/// timestamps and ownership, restartable mode with backup fallback, recurse
/// including empty subdirectories. The spellings are a compatibility
/// contract with robocopy and must not change.
const MIRROR_FLAGS: &str = "/COPY:DATO /ZB /E";

/// Render one mirror-copy command line.
///
/// The first command of a script truncates the unified log (`/UNILOG:`),
/// all later commands append (`/UNILOG+:`).
fn copy_line(pair: &Pair, log_path: &str, append: bool) -> String {
    let unilog = if append { "/UNILOG+:" } else { "/UNILOG:" };
    format!(
        r#"ROBOCOPY "{}" "{}" {} {}"{}" /TEE"#,
        pair.source_path, pair.target_path, MIRROR_FLAGS, unilog, log_path
    )
}

/// Render the trailing command invoking `analyzer`'s `analyze` subcommand
/// on the unified log
fn analyze_line(analyzer: &Path, log_path: &str) -> String {
    format!(r#""{}" analyze "{}""#, analyzer.display(), log_path)
}

/// Render the full script: one copy command per pair plus the trailing
/// analysis command, newline-separated. An empty relation yields the
/// analysis command alone.
pub fn render_script(pairs: &[Pair], log_path: &str, analyzer: &Path) -> String {
    let mut lines = Vec::with_capacity(pairs.len() + 1);
    for (i, pair) in pairs.iter().enumerate() {
        lines.push(copy_line(pair, log_path, i > 0));
    }
    lines.push(analyze_line(analyzer, log_path));
    lines.join("\n")
}

/// Generate the batch script from the stored relation and settings.
///
/// `analyzer` is the executable the script's final line invokes, normally
/// the current binary. Fails with [`Error::MissingSetting`] when the output
/// or log location has not been configured. Returns the path the script was
/// written to.
pub fn generate_script(store: &SettingsStore, analyzer: &Path) -> Result<PathBuf> {
    let output = store
        .get_setting(SettingKey::OutputScript)?
        .ok_or(Error::MissingSetting(SettingKey::OutputScript))?;
    let log_path = store
        .get_setting(SettingKey::LogFile)?
        .ok_or(Error::MissingSetting(SettingKey::LogFile))?;

    let pairs = store.list_pairs()?;
    tracing::info!("generating script for {} pair(s) into {}", pairs.len(), output);

    let script = render_script(&pairs, &log_path, analyzer);
    let output = PathBuf::from(output);
    write_replace(&output, &script)?;
    Ok(output)
}

/// Write through a temporary sibling then rename, so an interrupted write
/// never leaves a truncated script at the output path
fn write_replace(path: &Path, contents: &str) -> Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(source: &str, target: &str) -> Pair {
        Pair {
            source_path: source.to_string(),
            target_path: target.to_string(),
        }
    }

    #[test]
    fn test_render_two_pairs() {
        let pairs = vec![
            pair(r"C:\data\photos", r"D:\mirror\photos"),
            pair(r"C:\data\music", r"E:\mirror\music"),
        ];
        let script = render_script(&pairs, r"C:\logs\backup.log", Path::new(r"C:\bin\mirrorplan.exe"));

        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            r#"ROBOCOPY "C:\data\photos" "D:\mirror\photos" /COPY:DATO /ZB /E /UNILOG:"C:\logs\backup.log" /TEE"#
        );
        assert_eq!(
            lines[1],
            r#"ROBOCOPY "C:\data\music" "E:\mirror\music" /COPY:DATO /ZB /E /UNILOG+:"C:\logs\backup.log" /TEE"#
        );
        assert_eq!(
            lines[2],
            r#""C:\bin\mirrorplan.exe" analyze "C:\logs\backup.log""#
        );
    }

    #[test]
    fn test_render_empty_relation() {
        let script = render_script(&[], "backup.log", Path::new("mirrorplan"));
        assert_eq!(script, r#""mirrorplan" analyze "backup.log""#);
    }

    #[test]
    fn test_generate_requires_settings() {
        let store = SettingsStore::open_in_memory().unwrap();

        let err = generate_script(&store, Path::new("mirrorplan")).unwrap_err();
        assert!(matches!(err, Error::MissingSetting(SettingKey::OutputScript)));

        store.set_setting(SettingKey::OutputScript, "out.cmd").unwrap();
        let err = generate_script(&store, Path::new("mirrorplan")).unwrap_err();
        assert!(matches!(err, Error::MissingSetting(SettingKey::LogFile)));
    }

    #[test]
    fn test_generate_writes_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = tempfile::tempdir().unwrap();
        let tgt = tempfile::tempdir().unwrap();
        let out = dir.path().join("backup.cmd");
        std::fs::write(&out, "stale contents").unwrap();

        let store = SettingsStore::open_in_memory().unwrap();
        store.add_source(src.path()).unwrap();
        let source = store.list_sources().unwrap()[0].path.clone();
        store.add_target(&source, tgt.path()).unwrap();
        store
            .set_setting(SettingKey::OutputScript, &out.to_string_lossy())
            .unwrap();
        store.set_setting(SettingKey::LogFile, "run.log").unwrap();

        let written = generate_script(&store, Path::new("mirrorplan")).unwrap();
        assert_eq!(written, out);

        let contents = std::fs::read_to_string(&out).unwrap();
        let pairs = store.list_pairs().unwrap();
        assert_eq!(contents, render_script(&pairs, "run.log", Path::new("mirrorplan")));
        assert!(contents.starts_with("ROBOCOPY "));
        assert!(contents.ends_with(r#"analyze "run.log""#));

        // no temp sibling left behind
        assert!(!dir.path().join("backup.cmd.tmp").exists());
    }
}
