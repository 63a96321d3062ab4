//! Display-size bounding for a single file's patch.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Upper bounds for the inline diff of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLimit {
    pub max_lines: usize,
    pub max_bytes: usize,
}

impl Default for DisplayLimit {
    fn default() -> Self {
        Self {
            max_lines: 400,
            max_bytes: 48 * 1024,
        }
    }
}

impl DisplayLimit {
    pub fn unlimited() -> Self {
        Self {
            max_lines: usize::MAX,
            max_bytes: usize::MAX,
        }
    }
}

/// Marker line appended to a shortened patch.
pub fn truncation_marker(dropped_lines: usize) -> String {
    format!("... truncated {} more lines ...\n", dropped_lines)
}

/// Shorten `patch` for inline rendering.
///
/// The cut always lands on a line boundary and is followed by the marker
/// line. When shortening would not make the text strictly smaller, the patch
/// is returned as-is.
pub fn truncate_patch(patch: &str, limit: DisplayLimit) -> Cow<'_, str> {
    let max_lines = limit.max_lines.max(1);
    let lines: Vec<&str> = patch.split_inclusive('\n').collect();

    // Largest prefix of whole lines within both limits.
    let mut kept = 0;
    let mut kept_bytes = 0;
    for line in &lines {
        if kept == max_lines || kept_bytes + line.len() > limit.max_bytes {
            break;
        }
        kept += 1;
        kept_bytes += line.len();
    }

    if kept == lines.len() {
        return Cow::Borrowed(patch);
    }

    while kept > 0 && kept_bytes + truncation_marker(lines.len() - kept).len() >= patch.len() {
        kept -= 1;
        kept_bytes -= lines[kept].len();
    }

    let marker = truncation_marker(lines.len() - kept);
    if kept_bytes + marker.len() >= patch.len() {
        return Cow::Borrowed(patch);
    }

    // Every kept line ends with '\n' because at least one line follows it.
    let mut out = String::with_capacity(kept_bytes + marker.len());
    out.push_str(&patch[..kept_bytes]);
    out.push_str(&marker);
    Cow::Owned(out)
}

/// Number of lines a rendered patch occupies.
pub fn line_count(patch: &str) -> usize {
    patch.lines().count()
}
