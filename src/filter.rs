//! List filters for sessions and activity timelines.
//!
//! Filters are parsed from the `--filter` flag and applied through
//! `matched_indices`, which keeps positions into the original list so callers
//! can still address items by their unfiltered index.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::format::format_repo_name;
use crate::jules::{Activity, Session, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionFilter {
    #[default]
    All,
    Status(SessionState),
    /// Repository as `owner/name`.
    Repo(String),
}

impl SessionFilter {
    pub fn matches(&self, session: &Session) -> bool {
        match self {
            SessionFilter::All => true,
            SessionFilter::Status(state) => session.state == *state,
            SessionFilter::Repo(repo) => {
                format_repo_name(&session.source_context.source).eq_ignore_ascii_case(repo)
            }
        }
    }

    pub fn apply<'a>(&self, sessions: &'a [Session]) -> Vec<&'a Session> {
        matched_indices(sessions, |s| self.matches(s))
            .into_iter()
            .map(|i| &sessions[i])
            .collect()
    }
}

impl FromStr for SessionFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Ok(SessionFilter::All);
        }
        if let Some(state) = value.strip_prefix("status:") {
            return SessionState::from_wire(state)
                .map(SessionFilter::Status)
                .ok_or_else(|| {
                    let known: Vec<&str> = SessionState::ALL.iter().map(|s| s.as_str()).collect();
                    format!("unknown state '{}', expected one of {}", state, known.join(", "))
                });
        }
        if let Some(repo) = value.strip_prefix("repo:") {
            let repo = format_repo_name(repo.trim());
            if repo.is_empty() {
                return Err("repository filter needs a name, e.g. repo:owner/name".to_string());
            }
            return Ok(SessionFilter::Repo(repo.to_string()));
        }
        Err(format!(
            "invalid filter '{}', expected all, status:<STATE> or repo:<owner/name>",
            value
        ))
    }
}

impl fmt::Display for SessionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionFilter::All => write!(f, "all"),
            SessionFilter::Status(state) => write!(f, "status:{}", state.as_str()),
            SessionFilter::Repo(repo) => write!(f, "repo:{}", repo),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityFilter {
    #[default]
    All,
    Messages,
    Artifacts,
    HideProgress,
}

impl ActivityFilter {
    pub fn matches(self, activity: &Activity) -> bool {
        match self {
            ActivityFilter::All => true,
            ActivityFilter::Messages => activity.is_message(),
            ActivityFilter::Artifacts => activity.has_artifacts(),
            ActivityFilter::HideProgress => activity.progress_updated.is_none(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActivityFilter::All => "All Activities",
            ActivityFilter::Messages => "Messages Only",
            ActivityFilter::Artifacts => "Artifacts Only",
            ActivityFilter::HideProgress => "Hide Progress Updates",
        }
    }

    pub fn apply<'a>(self, activities: &'a [Activity]) -> Vec<&'a Activity> {
        matched_indices(activities, |a| self.matches(a))
            .into_iter()
            .map(|i| &activities[i])
            .collect()
    }
}

impl FromStr for ActivityFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(ActivityFilter::All),
            "messages" => Ok(ActivityFilter::Messages),
            "artifacts" => Ok(ActivityFilter::Artifacts),
            "hide-progress" => Ok(ActivityFilter::HideProgress),
            other => Err(format!(
                "invalid activity filter '{}', expected all, messages, artifacts or hide-progress",
                other
            )),
        }
    }
}

/// Indices of the items `matches` accepts, in original order.
pub fn matched_indices<T>(items: &[T], matches: impl Fn(&T) -> bool) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| matches(item))
        .map(|(i, _)| i)
        .collect()
}

/// Sorted, de-duplicated repository names across sessions.
pub fn repositories(sessions: &[Session]) -> Vec<String> {
    sessions
        .iter()
        .map(|s| format_repo_name(&s.source_context.source))
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
