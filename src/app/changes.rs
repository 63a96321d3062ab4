use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::io::AsyncReadExt;

use super::{session_id, session_label, App};
use crate::diff::{summarize_hunks, FileChange, PatchParser};
use crate::format::{format_pr_subtitle, format_pr_title, session_digest};
use crate::jules::{JulesApi, Media};
use crate::review::{
    approve_pr_command, file_heading, file_markdown, merge_pr_command, CodeReview,
};
use crate::ui::{DetailView, ListItem, ListSection, ListView, Notice, Presenter};

pub(super) struct PatchOptions {
    pub source: String,
    pub base: Option<String>,
    pub message: Option<String>,
    pub records: bool,
}

/// Read a patch from `file`, or from stdin when no file is given.
pub(super) async fn read_patch_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read patch {}", path.display())),
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read patch from stdin")?;
            Ok(raw)
        }
    }
}

/// File extension for a media MIME type.
fn media_extension(mime_type: &str) -> String {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" => return "jpg".to_string(),
        "image/svg+xml" => return "svg".to_string(),
        _ => {}
    }
    essence
        .split_once('/')
        .map(|(_, subtype)| subtype.split('+').next().unwrap_or(subtype))
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin")
        .to_string()
}

/// Decode a media payload; accepts bare base64 or a `data:` URL.
fn decode_media(media: &Media) -> Result<Vec<u8>> {
    let data = media.data.trim();
    let payload = match data.split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .with_context(|| format!("Media artifact ({}) is not valid base64", media.mime_type))
}

fn file_item(change: &FileChange) -> ListItem {
    let subtitle = match &change.previous_filename {
        Some(previous) => format!("{} from {}", change.status.label(), previous),
        None => change.status.label().to_string(),
    };
    let mut accessories = if change.binary {
        vec!["binary".to_string()]
    } else {
        vec![format!("+{} -{}", change.additions, change.deletions)]
    };
    let hunks = summarize_hunks(&change.hunks);
    if !hunks.is_empty() {
        accessories.push(hunks);
    }
    ListItem {
        id: change.filename.clone(),
        title: change.filename.clone(),
        subtitle: Some(subtitle),
        accessories,
        marker: None,
    }
}

impl<A: JulesApi, P: Presenter> App<A, P> {
    pub(super) async fn review(
        &mut self,
        session: &str,
        file: Option<&str>,
        full_diff: bool,
    ) -> Result<()> {
        let activities = self.all_activities(session).await?;
        let review = CodeReview::from_activities(&activities, self.config.display_limit());

        let selected = match file {
            Some(name) => Some(review.find(name).with_context(|| {
                let known: Vec<&str> = review.changes.iter().map(|c| c.filename.as_str()).collect();
                if known.is_empty() {
                    format!("No changed file matching '{}': the session has no code changes", name)
                } else {
                    format!("No changed file matching '{}'. Changed files: {}", name, known.join(", "))
                }
            })?),
            None => None,
        };

        if full_diff {
            let text = match selected {
                Some(change) => change.patch.clone(),
                None => review.full_diff(),
            };
            return self.presenter.render_text(&text);
        }

        if let Some(change) = selected {
            let mut view = DetailView::new(file_heading(change), file_markdown(change))
                .meta("Status", change.status.label())
                .meta("Changes", format!("+{} -{}", change.additions, change.deletions))
                .meta("Source", change.source.clone());
            if let Some(command) = &change.git_diff_command {
                view = view.action("Local diff", command.clone());
            }
            return self.presenter.render_detail(&view);
        }

        let session = self.api.get_session(session).await?;
        let mut view = DetailView::new(
            format!("Code Review: {}", session_label(&session)),
            review.markdown(),
        );
        if let Some(url) = session.pull_request_url() {
            let label = match format_pr_subtitle(url) {
                Some(repo) => format!("{} · {}", format_pr_title(url), repo),
                None => url.to_string(),
            };
            view = view
                .meta("Pull Request", label)
                .action("Approve PR", approve_pr_command(url))
                .action("Merge PR", merge_pr_command(url));
        }
        if !review.is_empty() {
            view = view.action(
                "Export diff",
                format!("jules review {} --full-diff", session_id(&session.name)),
            );
        }
        self.presenter.render_detail(&view)
    }

    pub(super) fn patch(&mut self, raw: &str, options: &PatchOptions) -> Result<()> {
        let changes = PatchParser::new()
            .base_commit(options.base.as_deref())
            .display_limit(self.config.display_limit())
            .parse(raw, &options.source, options.message.as_deref());

        if options.records {
            let json = serde_json::to_string_pretty(&changes)
                .context("Failed to serialize file records")?;
            return self.presenter.render_text(&json);
        }

        let view = ListView {
            title: match changes.len() {
                1 => "1 file changed".to_string(),
                n => format!("{} files changed", n),
            },
            sections: vec![ListSection {
                title: String::new(),
                items: changes.iter().map(file_item).collect(),
            }],
            empty_message: "No file sections found in the patch".to_string(),
            footer: None,
        };
        self.presenter.render_list(&view)
    }

    /// List media artifacts, or save them all under `target`.
    pub(super) async fn media(&mut self, session: &str, target: Option<PathBuf>) -> Result<()> {
        let activities = self.all_activities(session).await?;
        let media: Vec<&Media> = activities.iter().flat_map(|a| a.media()).collect();

        let Some(dir) = target else {
            let items = media
                .iter()
                .enumerate()
                .map(|(i, m)| ListItem {
                    id: (i + 1).to_string(),
                    title: format!("Media {}", i + 1),
                    subtitle: Some(m.mime_type.clone()),
                    accessories: vec![format!("~{} bytes", m.data.trim().len() * 3 / 4)],
                    marker: None,
                })
                .collect();
            let view = ListView {
                title: "Media".to_string(),
                sections: vec![ListSection {
                    title: String::new(),
                    items,
                }],
                empty_message: "No media artifacts in this session".to_string(),
                footer: (!media.is_empty())
                    .then(|| format!("Save with: jules media {} --save", session_id(session))),
            };
            return self.presenter.render_list(&view);
        };

        if media.is_empty() {
            self.presenter.notify(&Notice::failure(
                "Nothing to save",
                "No media artifacts in this session",
            ));
            return Ok(());
        }

        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let stamp = self.now.timestamp_millis();
        let id = session_id(session);

        let mut saved = Vec::new();
        for (i, item) in media.iter().enumerate() {
            let bytes = decode_media(item)?;
            let path = dir.join(format!(
                "{}-{}-{}.{}",
                id,
                stamp,
                i + 1,
                media_extension(&item.mime_type)
            ));
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "saved media");
            saved.push(ListItem {
                id: (i + 1).to_string(),
                title: path.display().to_string(),
                subtitle: Some(item.mime_type.clone()),
                accessories: vec![format!("{} bytes", bytes.len())],
                marker: None,
            });
        }

        self.presenter.notify(
            &Notice::success(format!("Saved {} media files", saved.len()))
                .with_message(dir.display().to_string()),
        );
        let view = ListView {
            title: "Saved Media".to_string(),
            sections: vec![ListSection {
                title: String::new(),
                items: saved,
            }],
            ..ListView::default()
        };
        self.presenter.render_list(&view)
    }

    pub(super) async fn digest(&mut self, session: &str, max_chars: usize) -> Result<()> {
        let activities = self.all_activities(session).await?;
        if activities.is_empty() {
            self.presenter
                .notify(&Notice::failure("Nothing to summarize", "The session has no activities"));
            return Ok(());
        }
        let digest = session_digest(&activities, max_chars);
        self.presenter.render_text(&digest)
    }
}
