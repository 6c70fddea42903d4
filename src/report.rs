//! Log classification - summarizes a robocopy unified log into a report.
//!
//! Robocopy writes its unified log as UTF-16 text, one event per line. Each
//! line is matched against the four prefixes robocopy emits for changed
//! entries and collected into one bucket per event kind; everything else
//! (headers, per-file progress, the summary table) is dropped. The report
//! is written next to the log in the same encoding.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::{Error, Result};

/// Event categories recognized in the unified log, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Modified,
    Newer,
    NewFile,
    NewDir,
}

impl Category {
    /// All categories, in match priority and report order
    pub fn all() -> &'static [Category] {
        &[
            Category::Modified,
            Category::Newer,
            Category::NewFile,
            Category::NewDir,
        ]
    }

    /// Line pattern for this category: the event token anchored after
    /// optional leading whitespace, followed by more whitespace
    fn pattern(&self) -> &'static str {
        match self {
            Category::Modified => r"^\s*Modified\s",
            Category::Newer => r"^\s*Newer\s",
            Category::NewFile => r"^\s*New\sFile\s",
            Category::NewDir => r"^\s*New\sDir\s",
        }
    }
}

fn rules() -> &'static [(Category, Regex)] {
    static RULES: OnceLock<Vec<(Category, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        Category::all()
            .iter()
            .map(|c| (*c, Regex::new(c.pattern()).expect("classifier: invalid pattern")))
            .collect()
    })
}

/// Classify one log line, or None for lines outside all four categories
pub fn classify(line: &str) -> Option<Category> {
    rules()
        .iter()
        .find(|(_, re)| re.is_match(line))
        .map(|(category, _)| *category)
}

/// Classified log lines, one bucket per category.
#[derive(Debug, Default)]
pub struct Report {
    pub modified: Vec<String>,
    pub newer: Vec<String>,
    pub new_files: Vec<String>,
    pub new_dirs: Vec<String>,
}

impl Report {
    /// Classify every line into its bucket, trimmed of surrounding
    /// whitespace. Unrecognized lines are dropped.
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut report = Report::default();
        for line in lines {
            let Some(category) = classify(line) else {
                continue;
            };
            let bucket = match category {
                Category::Modified => &mut report.modified,
                Category::Newer => &mut report.newer,
                Category::NewFile => &mut report.new_files,
                Category::NewDir => &mut report.new_dirs,
            };
            bucket.push(line.trim().to_string());
        }
        report
    }

    /// Render the report: four newline-joined groups concatenated
    /// back-to-back. There is no separator between groups; legacy report
    /// consumers expect that exact shape.
    pub fn render(&self) -> String {
        [&self.modified, &self.newer, &self.new_files, &self.new_dirs]
            .iter()
            .map(|bucket| bucket.join("\n"))
            .collect()
    }

    /// Total number of classified lines across all buckets
    pub fn len(&self) -> usize {
        self.modified.len() + self.newer.len() + self.new_files.len() + self.new_dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Report path for a log file: `<stem>_report<extension>`, alongside the log
pub fn report_path(log_path: &Path) -> PathBuf {
    let stem = log_path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let mut name = format!("{}_report", stem);
    if let Some(ext) = log_path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    log_path.with_file_name(name)
}

/// Decode UTF-16 bytes, honoring a leading byte-order mark. Robocopy logs
/// are little-endian, so that is the default when no mark is present.
fn decode_utf16(bytes: &[u8]) -> Result<String> {
    let (body, big_endian) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        rest => (rest, false),
    };
    if body.len() % 2 != 0 {
        return Err(Error::Decode("odd byte length for UTF-16 text".to_string()));
    }

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|b| {
            if big_endian {
                u16::from_be_bytes([b[0], b[1]])
            } else {
                u16::from_le_bytes([b[0], b[1]])
            }
        })
        .collect();

    String::from_utf16(&units).map_err(|e| Error::Decode(e.to_string()))
}

/// Encode text as UTF-16LE with a byte-order mark, the log's own encoding
fn encode_utf16(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

/// Classify a unified log and write the report file next to it.
///
/// Returns the report path and the classified buckets. A log with no
/// classifiable lines still produces a report file, just an empty one.
pub fn analyze_log(log_path: &Path) -> Result<(PathBuf, Report)> {
    let bytes = std::fs::read(log_path)?;
    let text = decode_utf16(&bytes)?;

    let report = Report::from_lines(text.lines());
    let out_path = report_path(log_path);
    tracing::info!(
        "writing report with {} classified line(s) to {}",
        report.len(),
        out_path.display()
    );

    std::fs::write(&out_path, encode_utf16(&report.render()))?;
    Ok((out_path, report))
}
