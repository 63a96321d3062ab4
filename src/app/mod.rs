//! Command handlers. Each subcommand talks to a [`JulesApi`] and renders
//! through a [`Presenter`], so the same code drives the terminal and tests.

mod changes;
mod sessions;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::Subcommand;

use crate::config::Config;
use crate::filter::{ActivityFilter, SessionFilter};
use crate::format::DIGEST_MAX_CHARS;
use crate::init;
use crate::jules::{JulesApi, Session};
use crate::ui::{Notice, NoticeStyle, Presenter};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write a default config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// List sessions grouped by creation date
    Sessions {
        /// all, status:<STATE> or repo:<owner/name>
        #[arg(long, default_value = "all")]
        filter: SessionFilter,
        #[arg(long)]
        page_size: Option<u32>,
        /// Continue from the token printed below a previous page
        #[arg(long)]
        page_token: Option<String>,
    },
    /// Show a session's prompt and metadata
    Show { session: String },
    /// Timeline of a session
    Activities {
        session: String,
        /// all, messages, artifacts or hide-progress
        #[arg(long, default_value = "all")]
        filter: ActivityFilter,
        /// Show one activity in full, by its number in the list
        #[arg(long)]
        show: Option<usize>,
        /// Print every activity with artifacts expanded
        #[arg(long)]
        full: bool,
    },
    /// Show the latest plan of a session
    Plan {
        session: String,
        /// Show one step in detail (1-based)
        #[arg(long)]
        step: Option<usize>,
    },
    /// Approve the pending plan
    Approve { session: String },
    /// Decline the pending plan with a reason
    Decline {
        session: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Send a message to a session (opens the editor when omitted)
    Send {
        session: String,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Start a new session
    Launch {
        /// owner/repo or a full sources/... name
        #[arg(long)]
        source: String,
        /// Starting branch (default: the repository's default branch)
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        require_plan_approval: bool,
        /// Open a pull request automatically when done
        #[arg(long)]
        auto_pr: bool,
    },
    /// List connected repositories
    Sources,
    /// Code review of every change a session produced
    Review {
        session: String,
        /// Show a single file (exact path or unique suffix)
        #[arg(long)]
        file: Option<String>,
        /// Print the untruncated diff for export
        #[arg(long)]
        full_diff: bool,
    },
    /// Split a local unified diff into per-file records
    Patch {
        /// Patch file (stdin when omitted)
        file: Option<PathBuf>,
        #[arg(long, default_value = "local")]
        source: String,
        /// Base commit, enables per-file git diff commands
        #[arg(long)]
        base: Option<String>,
        /// Suggested commit message attached to every record
        #[arg(long)]
        message: Option<String>,
        /// Print the records as JSON
        #[arg(long)]
        records: bool,
    },
    /// List or save media artifacts of a session
    Media {
        session: String,
        /// Decode and write every artifact to disk
        #[arg(long)]
        save: bool,
        /// Target directory (implies --save)
        #[arg(long)]
        save_dir: Option<PathBuf>,
    },
    /// Recent sessions and how many need attention
    Status,
    /// Compact timeline text for summarization
    Digest {
        session: String,
        #[arg(long, default_value_t = DIGEST_MAX_CHARS)]
        max_chars: usize,
    },
}

pub struct App<A, P> {
    api: A,
    presenter: P,
    config: Config,
    now: DateTime<Local>,
}

impl<A: JulesApi, P: Presenter> App<A, P> {
    pub fn new(api: A, presenter: P, config: Config) -> Self {
        Self {
            api,
            presenter,
            config,
            now: Local::now(),
        }
    }

    /// Fix the clock used for date grouping and media file names.
    pub fn with_now(mut self, now: DateTime<Local>) -> Self {
        self.now = now;
        self
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Run one command. Failures are shown as a notice and returned.
    pub async fn run(&mut self, command: Command) -> Result<()> {
        let result = self.dispatch(command).await;
        if let Err(err) = &result {
            tracing::debug!(error = ?err, "command failed");
            let causes: Vec<String> = err.chain().skip(1).map(|c| c.to_string()).collect();
            self.presenter.notify(&Notice {
                style: NoticeStyle::Failure,
                title: err.to_string(),
                message: (!causes.is_empty()).then(|| causes.join(": ")),
            });
        }
        result
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Init { force } => init::run_init(force),
            Command::Sessions {
                filter,
                page_size,
                page_token,
            } => self.sessions(&filter, page_size, page_token.as_deref()).await,
            Command::Show { session } => self.show(&session).await,
            Command::Activities {
                session,
                filter,
                show,
                full,
            } => self.activities(&session, filter, show, full).await,
            Command::Plan { session, step } => self.plan(&session, step).await,
            Command::Approve { session } => self.approve(&session).await,
            Command::Decline { session, reason } => self.decline(&session, reason).await,
            Command::Send { session, message } => self.send(&session, message).await,
            Command::Launch {
                source,
                branch,
                prompt,
                title,
                require_plan_approval,
                auto_pr,
            } => {
                let options = sessions::LaunchOptions {
                    source,
                    branch,
                    prompt,
                    title,
                    require_plan_approval,
                    auto_pr,
                };
                self.launch(options).await
            }
            Command::Sources => self.sources().await,
            Command::Review {
                session,
                file,
                full_diff,
            } => self.review(&session, file.as_deref(), full_diff).await,
            Command::Patch {
                file,
                source,
                base,
                message,
                records,
            } => {
                let raw = changes::read_patch_input(file.as_deref()).await?;
                let options = changes::PatchOptions {
                    source,
                    base,
                    message,
                    records,
                };
                self.patch(&raw, &options)
            }
            Command::Media {
                session,
                save,
                save_dir,
            } => {
                let target = match save_dir {
                    Some(dir) => Some(dir),
                    None if save => Some(self.config.download_dir()),
                    None => None,
                };
                self.media(&session, target).await
            }
            Command::Status => self.status().await,
            Command::Digest { session, max_chars } => self.digest(&session, max_chars).await,
        }
    }
}

/// `123` for both `123` and `sessions/123`.
fn session_id(session: &str) -> &str {
    let trimmed = session.trim().trim_matches('/');
    trimmed.strip_prefix("sessions/").unwrap_or(trimmed)
}

fn session_label(session: &Session) -> String {
    crate::format::format_session_title(session, crate::format::DEFAULT_TITLE_LENGTH)
}

#[cfg(test)]
mod tests;
