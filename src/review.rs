//! Code review page assembled from every change set of a session.

use std::collections::HashSet;

use crate::diff::{join_patches, line_count, summarize_hunks, DisplayLimit, FileChange, PatchParser};
use crate::format::fence;
use crate::jules::Activity;

/// Parse every change set in `activities` into per-file records.
///
/// The first record for a filename wins; the result is sorted by filename.
pub fn collect_changes(activities: &[Activity], limit: DisplayLimit) -> Vec<FileChange> {
    let mut seen = HashSet::new();
    let mut changes = Vec::new();

    for activity in activities {
        for (change_set, patch) in activity.change_sets() {
            let parser = PatchParser::new()
                .base_commit(patch.base_commit_id.as_deref())
                .display_limit(limit);
            let files = parser.parse(
                &patch.unidiff_patch,
                &change_set.source,
                patch.suggested_commit_message.as_deref(),
            );
            tracing::debug!(activity = %activity.id, files = files.len(), "parsed change set");
            for file in files {
                if seen.insert(file.filename.clone()) {
                    changes.push(file);
                }
            }
        }
    }

    changes.sort_by(|a, b| a.filename.cmp(&b.filename));
    changes
}

#[derive(Debug, Clone, Default)]
pub struct CodeReview {
    pub changes: Vec<FileChange>,
    /// First suggested commit message among the changes.
    pub commit_message: Option<String>,
}

impl CodeReview {
    pub fn from_activities(activities: &[Activity], limit: DisplayLimit) -> Self {
        Self::new(collect_changes(activities, limit))
    }

    pub fn new(changes: Vec<FileChange>) -> Self {
        let commit_message = changes
            .iter()
            .find_map(|c| c.commit_message.clone())
            .filter(|m| !m.trim().is_empty());
        Self {
            changes,
            commit_message,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Exact-name lookup, falling back to a unique path suffix (`lib.rs`).
    pub fn find(&self, name: &str) -> Option<&FileChange> {
        if let Some(exact) = self.changes.iter().find(|c| c.filename == name) {
            return Some(exact);
        }
        let suffix = format!("/{}", name.trim_start_matches('/'));
        let mut matches = self.changes.iter().filter(|c| c.filename.ends_with(&suffix));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// All original patches as one diff.
    pub fn full_diff(&self) -> String {
        join_patches(self.changes.iter().map(|c| c.patch.as_str()))
    }

    pub fn markdown(&self) -> String {
        if self.changes.is_empty() {
            return "# No Code Changes\n\nThis session has no code changes to review.".to_string();
        }

        let mut out = String::new();
        if let Some(message) = &self.commit_message {
            out.push_str(&format!(
                "## Suggested Commit Message\n\n{}\n\n---\n\n",
                message
            ));
        }
        out.push_str(&format!("## {} Files Changed\n\n", self.changes.len()));
        for change in &self.changes {
            out.push_str(&format!("### {}\n\n", file_heading(change)));
            out.push_str(&fence(&change.display_patch, "diff"));
            out.push_str("\n\n");
        }
        out
    }
}

/// `name [L lines] · @@ ... @@`
pub fn file_heading(change: &FileChange) -> String {
    let hunks = summarize_hunks(&change.hunks);
    let lines = line_count(&change.display_patch);
    if hunks.is_empty() {
        format!("{} [{} lines]", change.filename, lines)
    } else {
        format!("{} [{} lines] {}", change.filename, lines, hunks)
    }
}

/// Standalone page for one file.
pub fn file_markdown(change: &FileChange) -> String {
    let mut out = format!("# {}\n\n", file_heading(change));
    if let Some(previous) = &change.previous_filename {
        out.push_str(&format!("_{} from {}_\n\n", change.status.label(), previous));
    }
    out.push_str(&fence(&change.display_patch, "diff"));
    if change.is_truncated() {
        out.push_str("\n\n_Diff truncated for display. Use --full-diff for the complete patch._");
    }
    out
}

pub fn approve_pr_command(pr_url: &str) -> String {
    format!("gh pr review --approve {}", pr_url)
}

pub fn merge_pr_command(pr_url: &str) -> String {
    format!("gh pr merge --squash {}", pr_url)
}
