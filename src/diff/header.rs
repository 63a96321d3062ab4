//! Path extraction from the metadata lines of a single file section.

use tracing::warn;

/// Paths found in a `diff --git` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPaths {
    pub old: String,
    pub new: String,
}

/// Strip the single-char diff prefix (a/, b/, w/, etc.) from a --- or +++ path.
pub fn strip_diff_prefix(path: &str) -> String {
    let path = path.trim_end_matches(['\r', '\n']);
    // git appends a tab when the path contains spaces
    let path = path.strip_suffix('\t').unwrap_or(path);
    if path.len() >= 2 && path.as_bytes()[1] == b'/' && path.as_bytes()[0].is_ascii_lowercase() {
        path[2..].to_string()
    } else {
        path.to_string()
    }
}

/// Extract both paths from a "diff --git" line
///
/// Handles various formats:
/// - `diff --git a/src/foo.rs b/src/foo.rs` (standard prefix)
/// - `diff --git c/src/foo.rs w/src/foo.rs` (mnemonicPrefix)
/// - `diff --git a/file with spaces.rs b/file with spaces.rs`
/// - `diff --git a/old.rs b/new.rs` (rename)
///
/// Returns `None` for ambiguous cases (e.g. a rename where both paths contain
/// the separator sequence). Callers fall back to `rename`/`+++`/`---` lines.
pub fn parse_git_header(git_diff_line: &str) -> Option<HeaderPaths> {
    let line = git_diff_line.trim_end_matches(['\r', '\n']);
    let content = line.strip_prefix("diff --git ")?;

    if content.len() < 2 || content.as_bytes()[1] != b'/' {
        warn!("Failed to parse git diff line: {}", line);
        return None;
    }

    let first_prefix = content.as_bytes()[0];
    let first_path = &content[2..];

    // Non-rename: "path Y/path" where both halves are equal.
    let total_len = first_path.len();
    if total_len >= 3 && (total_len - 3) % 2 == 0 {
        let path_len = (total_len - 3) / 2;
        let bytes = first_path.as_bytes();
        if path_len > 0
            && bytes[path_len] == b' '
            && bytes[path_len + 2] == b'/'
            && first_path.is_char_boundary(path_len)
        {
            let path1 = &first_path[..path_len];
            let path2 = &first_path[path_len + 3..];
            if path1 == path2 {
                return Some(HeaderPaths {
                    old: path1.to_string(),
                    new: path2.to_string(),
                });
            }
        }
    }

    // Renames: look for the expected second prefix. Known pairs: a→b, c→w, i→w, o→w.
    let second_prefix = match first_prefix {
        b'a' => b'b',
        b'c' | b'i' | b'o' => b'w',
        _ => {
            warn!("Failed to parse git diff line (unknown prefix): {}", line);
            return None;
        }
    };

    let bytes = first_path.as_bytes();
    let matches: Vec<usize> = (0..bytes.len().saturating_sub(2))
        .filter(|&i| bytes[i] == b' ' && bytes[i + 1] == second_prefix && bytes[i + 2] == b'/')
        .collect();

    if let [sep] = matches[..] {
        let old = &first_path[..sep];
        let new = &first_path[sep + 3..];
        if !old.is_empty() && !new.is_empty() {
            return Some(HeaderPaths {
                old: old.to_string(),
                new: new.to_string(),
            });
        }
    }

    None
}

/// Paths named by a `Binary files X and Y differ` marker.
pub fn parse_binary_marker(line: &str) -> Option<(Option<String>, Option<String>)> {
    let rest = line
        .trim_end_matches(['\r', '\n'])
        .strip_prefix("Binary files ")?
        .strip_suffix(" differ")?;
    let (old, new) = rest.split_once(" and ")?;
    let side = |p: &str| (p != "/dev/null").then(|| strip_diff_prefix(p));
    Some((side(old), side(new)))
}

/// Best-effort filename for a header that could not be parsed.
pub fn sanitize_header(line: &str) -> String {
    let rest = line.strip_prefix("diff --git").unwrap_or(line);
    let cleaned: String = rest.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        super::PLACEHOLDER_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}
