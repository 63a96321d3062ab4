//! Hunk header extraction and compact display.

use super::GIT_HEADER_PREFIX;

/// Whether a line (terminator allowed) opens a hunk.
pub fn is_hunk_header(line: &str) -> bool {
    line.starts_with("@@ ")
}

/// Return the hunk headers of a file section exactly as they appear.
///
/// Ranges are not validated; `@@ -x +y @@` with missing or malformed numbers
/// is passed through unchanged. Lines before the `diff --git` header (mail
/// preamble) are not part of the file and are ignored.
pub fn hunk_headers(section: &str) -> Vec<String> {
    let lines: Vec<&str> = section.lines().collect();
    let start = lines
        .iter()
        .position(|line| line.starts_with(GIT_HEADER_PREFIX))
        .unwrap_or(0);
    lines[start..]
        .iter()
        .filter(|line| is_hunk_header(line))
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

/// The `@@ ... @@` part of a hunk header, without the trailing context hint.
pub fn hunk_range(header: &str) -> &str {
    match header.get(2..).and_then(|rest| rest.find("@@")) {
        Some(end) => &header[..end + 4],
        None => header,
    }
}

/// Compact accessory text for a file's hunks, e.g. `· @@ -10,5 +10,7 @@`.
///
/// Empty when the file has no hunks (binary or mode-only changes).
pub fn summarize_hunks(hunks: &[String]) -> String {
    if hunks.is_empty() {
        return String::new();
    }
    let ranges: Vec<&str> = hunks.iter().map(|h| hunk_range(h)).collect();
    format!("· {}", ranges.join(" "))
}
