//! Unified diff splitting utilities.
//!
//! This module turns the single patch blob attached to a change set into
//! per-file records:
//! - Section boundaries at every `diff --git` line (lossless partition)
//! - Filename resolution from the header, rename/copy lines or `---`/`+++`
//! - Hunk header extraction for compact display
//! - Display truncation on line boundaries

mod header;
mod hunk;
mod truncate;

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

pub use header::{parse_git_header, strip_diff_prefix, HeaderPaths};
pub use hunk::{hunk_headers, hunk_range, is_hunk_header, summarize_hunks};
pub use truncate::{line_count, truncate_patch, truncation_marker, DisplayLimit};

/// Filename used when a section names no path at all.
pub const PLACEHOLDER_FILENAME: &str = "unknown";

const GIT_HEADER_PREFIX: &str = "diff --git ";

/// Represents the type of a line in a diff patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    /// Line added in the new version (starts with +)
    Added,
    /// Line removed from the old version (starts with -)
    Removed,
    /// Context line, unchanged (starts with space)
    Context,
    /// Hunk header (@@ ... @@)
    Header,
    /// Metadata lines (diff --, +++, index, etc.)
    Meta,
}

/// Classify a line and extract its content without the prefix
pub fn classify_line(line: &str) -> (LineType, &str) {
    if line.starts_with("@@") {
        (LineType::Header, line)
    } else if line.starts_with("+++")
        || line.starts_with("---")
        || line.starts_with("diff ")
        || line.starts_with("index ")
        || line.starts_with("new file mode")
        || line.starts_with("deleted file mode")
        || line.starts_with("similarity index")
        || line.starts_with("rename ")
        || line.starts_with("Binary files ")
    {
        (LineType::Meta, line)
    } else if let Some(content) = line.strip_prefix('+') {
        (LineType::Added, content)
    } else if let Some(content) = line.strip_prefix('-') {
        (LineType::Removed, content)
    } else if let Some(content) = line.strip_prefix(' ') {
        (LineType::Context, content)
    } else {
        (LineType::Context, line)
    }
}

/// How a file is affected by its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
}

impl FileStatus {
    pub fn label(self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Deleted => "deleted",
            FileStatus::Modified => "modified",
            FileStatus::Renamed => "renamed",
            FileStatus::Copied => "copied",
        }
    }
}

/// One file's share of a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    /// Post-image path, or the pre-image path for deletions.
    /// Unique within one parse result.
    pub filename: String,
    /// Pre-image path of a rename or copy.
    pub previous_filename: Option<String>,
    pub status: FileStatus,
    pub binary: bool,
    pub additions: usize,
    pub deletions: usize,
    /// Verbatim slice of the input belonging to this file.
    pub patch: String,
    /// `patch`, possibly truncated for inline rendering.
    pub display_patch: String,
    pub hunks: Vec<String>,
    pub source: String,
    pub commit_message: Option<String>,
    pub git_diff_command: Option<String>,
}

impl FileChange {
    /// Whether `display_patch` was shortened.
    pub fn is_truncated(&self) -> bool {
        self.display_patch.len() != self.patch.len()
    }
}

/// Configurable splitter. `parse_patch` covers the common case.
#[derive(Debug, Clone, Default)]
pub struct PatchParser<'a> {
    base_commit: Option<&'a str>,
    limit: DisplayLimit,
}

impl<'a> PatchParser<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base commit id; enables `git_diff_command`.
    pub fn base_commit(mut self, base_commit: Option<&'a str>) -> Self {
        self.base_commit = base_commit.filter(|b| !b.trim().is_empty());
        self
    }

    pub fn display_limit(mut self, limit: DisplayLimit) -> Self {
        self.limit = limit;
        self
    }

    pub fn parse(
        &self,
        raw: &str,
        source: &str,
        commit_message: Option<&str>,
    ) -> Vec<FileChange> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut emitted: HashSet<String> = HashSet::new();

        split_sections(raw)
            .into_iter()
            .map(|section| {
                let meta = SectionMeta::scan(section);
                let path = meta.filename();
                let filename = unique_name(&mut seen, &mut emitted, &path);

                let display_patch = if meta.binary {
                    section.to_string()
                } else {
                    truncate_patch(section, self.limit).into_owned()
                };

                let git_diff_command = self
                    .base_commit
                    .map(|base| git_diff_command(base, &path, meta.previous_filename(&path)));

                FileChange {
                    previous_filename: meta.previous_filename(&path).map(str::to_string),
                    status: meta.status(),
                    binary: meta.binary,
                    additions: meta.additions,
                    deletions: meta.deletions,
                    hunks: meta.hunks,
                    filename,
                    patch: section.to_string(),
                    display_patch,
                    source: source.to_string(),
                    commit_message: commit_message.map(str::to_string),
                    git_diff_command,
                }
            })
            .collect()
    }
}

/// Split a unified diff into per-file records with default display limits.
///
/// Concatenating the returned `patch` fields reproduces `raw` exactly.
pub fn parse_patch(raw: &str, source: &str, commit_message: Option<&str>) -> Vec<FileChange> {
    PatchParser::new().parse(raw, source, commit_message)
}

/// Rebuild a multi-file diff from records, one newline between sections.
pub fn join_patches<'a>(patches: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for patch in patches {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(patch);
    }
    out
}

/// Byte slices of `raw`, one per file section, covering all of it.
///
/// Text before the first header stays with the first section.
fn split_sections(raw: &str) -> Vec<&str> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut starts = Vec::new();
    let mut offset = 0;
    for line in raw.split_inclusive('\n') {
        if line.starts_with(GIT_HEADER_PREFIX) {
            starts.push(offset);
        }
        offset += line.len();
    }

    if starts.is_empty() {
        return vec![raw];
    }
    starts[0] = 0;

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(raw.len());
            &raw[start..end]
        })
        .collect()
}

/// `path`, or `path (n)` with the smallest free `n` when the name is taken.
///
/// A suffixed name may collide with a real path later in the patch, so names
/// are checked against everything emitted so far.
fn unique_name(
    seen: &mut HashMap<String, usize>,
    emitted: &mut HashSet<String>,
    path: &str,
) -> String {
    let count = seen.entry(path.to_string()).or_insert(0);
    *count += 1;
    let mut name = path.to_string();
    if emitted.contains(&name) {
        warn!(path, occurrence = *count, "file appears twice in one patch");
        let mut n = (*count).max(2);
        loop {
            name = format!("{} ({})", path, n);
            if !emitted.contains(&name) {
                break;
            }
            n += 1;
        }
    }
    emitted.insert(name.clone());
    name
}

fn git_diff_command(base: &str, path: &str, previous: Option<&str>) -> String {
    let quote = |s: &str| shell_words::quote(s).into_owned();
    match previous {
        Some(old) => format!(
            "git diff -M {} -- {} {}",
            quote(base),
            quote(old),
            quote(path)
        ),
        None => format!("git diff {} -- {}", quote(base), quote(path)),
    }
}

/// Undo git's C-style quoting of unusual paths (`"a/t\303\251st"`).
fn unquote_path(path: &str) -> String {
    let path = path.trim_end_matches(['\r', '\n']);
    let Some(inner) = path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) else {
        return path.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some('"') => bytes.push(b'"'),
            Some('\\') => bytes.push(b'\\'),
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => {
                bytes.push(b'\\');
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn side_path(rest: &str) -> Option<String> {
    let rest = rest.trim_end_matches(['\r', '\n']);
    let rest = rest.split('\t').next().unwrap_or(rest);
    if rest == "/dev/null" {
        None
    } else {
        Some(strip_diff_prefix(&unquote_path(rest)))
    }
}

/// Metadata collected from one section's lines.
#[derive(Debug, Default)]
struct SectionMeta {
    header_line: Option<String>,
    header: Option<HeaderPaths>,
    rename_from: Option<String>,
    rename_to: Option<String>,
    copy_from: Option<String>,
    copy_to: Option<String>,
    minus: Option<String>,
    plus: Option<String>,
    minus_dev_null: bool,
    plus_dev_null: bool,
    new_file: bool,
    deleted_file: bool,
    binary: bool,
    binary_paths: Option<(Option<String>, Option<String>)>,
    hunks: Vec<String>,
    additions: usize,
    deletions: usize,
}

impl SectionMeta {
    fn scan(section: &str) -> Self {
        let mut meta = SectionMeta::default();
        let has_header = section
            .split_inclusive('\n')
            .any(|l| l.starts_with(GIT_HEADER_PREFIX));
        let mut in_header = !has_header;
        let mut in_hunks = false;

        for line in section.lines() {
            let line = line.trim_end_matches('\r');

            if !in_header {
                // Skip preamble (e.g. format-patch mail headers).
                if line.starts_with(GIT_HEADER_PREFIX) {
                    in_header = true;
                    meta.header_line = Some(line.to_string());
                    meta.header = parse_git_header(line);
                }
                continue;
            }

            if is_hunk_header(line) {
                in_hunks = true;
                continue;
            }

            if in_hunks {
                if line.starts_with('+') {
                    meta.additions += 1;
                } else if line.starts_with('-') {
                    meta.deletions += 1;
                }
                continue;
            }

            if line.starts_with("deleted file mode") {
                meta.deleted_file = true;
            } else if line.starts_with("new file mode") {
                meta.new_file = true;
            } else if let Some(rest) = line.strip_prefix("rename from ") {
                meta.rename_from = Some(unquote_path(rest));
            } else if let Some(rest) = line.strip_prefix("rename to ") {
                meta.rename_to = Some(unquote_path(rest));
            } else if let Some(rest) = line.strip_prefix("copy from ") {
                meta.copy_from = Some(unquote_path(rest));
            } else if let Some(rest) = line.strip_prefix("copy to ") {
                meta.copy_to = Some(unquote_path(rest));
            } else if let Some(rest) = line.strip_prefix("--- ") {
                meta.minus_dev_null = rest.starts_with("/dev/null");
                meta.minus = side_path(rest);
            } else if let Some(rest) = line.strip_prefix("+++ ") {
                meta.plus_dev_null = rest.starts_with("/dev/null");
                meta.plus = side_path(rest);
            } else if line.starts_with("Binary files ") {
                meta.binary = true;
                meta.binary_paths = header::parse_binary_marker(line);
            } else if line.starts_with("GIT binary patch") {
                meta.binary = true;
            }
        }

        meta.hunks = hunk_headers(section);
        meta
    }

    fn is_deletion(&self) -> bool {
        self.deleted_file || self.plus_dev_null
    }

    fn old_path(&self) -> Option<&str> {
        self.header
            .as_ref()
            .map(|h| h.old.as_str())
            .or(self.rename_from.as_deref())
            .or(self.copy_from.as_deref())
            .or(self.minus.as_deref())
            .or(self
                .binary_paths
                .as_ref()
                .and_then(|(old, _)| old.as_deref()))
    }

    fn new_path(&self) -> Option<&str> {
        self.header
            .as_ref()
            .map(|h| h.new.as_str())
            .or(self.rename_to.as_deref())
            .or(self.copy_to.as_deref())
            .or(self.plus.as_deref())
            .or(self
                .binary_paths
                .as_ref()
                .and_then(|(_, new)| new.as_deref()))
    }

    fn filename(&self) -> String {
        let resolved = if self.is_deletion() {
            self.old_path().or(self.new_path())
        } else {
            self.new_path().or(self.old_path())
        };

        match (resolved, &self.header_line) {
            (Some(path), _) => path.to_string(),
            (None, Some(line)) => {
                warn!("Falling back to raw header for filename: {}", line);
                header::sanitize_header(line)
            }
            (None, None) => PLACEHOLDER_FILENAME.to_string(),
        }
    }

    fn status(&self) -> FileStatus {
        if self.new_file || self.minus_dev_null {
            FileStatus::Added
        } else if self.is_deletion() {
            FileStatus::Deleted
        } else if self.copy_from.is_some() || self.copy_to.is_some() {
            FileStatus::Copied
        } else if self.rename_from.is_some()
            || self.rename_to.is_some()
            || matches!((self.old_path(), self.new_path()), (Some(o), Some(n)) if o != n)
        {
            FileStatus::Renamed
        } else {
            FileStatus::Modified
        }
    }

    fn previous_filename<'s>(&'s self, filename: &str) -> Option<&'s str> {
        match self.status() {
            FileStatus::Renamed | FileStatus::Copied => {
                self.old_path().filter(|old| *old != filename)
            }
            _ => None,
        }
    }
}
