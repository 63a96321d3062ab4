use serde::{Deserialize, Serialize};

/// Lifecycle of a session as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    #[default]
    StateUnspecified,
    Queued,
    Planning,
    AwaitingPlanApproval,
    AwaitingUserFeedback,
    InProgress,
    Paused,
    Failed,
    Completed,
    #[serde(other)]
    Unknown,
}

impl SessionState {
    pub const ALL: [SessionState; 9] = [
        SessionState::StateUnspecified,
        SessionState::Queued,
        SessionState::Planning,
        SessionState::AwaitingPlanApproval,
        SessionState::AwaitingUserFeedback,
        SessionState::InProgress,
        SessionState::Paused,
        SessionState::Failed,
        SessionState::Completed,
    ];

    /// Wire name, e.g. `AWAITING_PLAN_APPROVAL`.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::StateUnspecified => "STATE_UNSPECIFIED",
            SessionState::Queued => "QUEUED",
            SessionState::Planning => "PLANNING",
            SessionState::AwaitingPlanApproval => "AWAITING_PLAN_APPROVAL",
            SessionState::AwaitingUserFeedback => "AWAITING_USER_FEEDBACK",
            SessionState::InProgress => "IN_PROGRESS",
            SessionState::Paused => "PAUSED",
            SessionState::Failed => "FAILED",
            SessionState::Completed => "COMPLETED",
            SessionState::Unknown => "UNKNOWN",
        }
    }

    /// Parse a wire name, case-insensitively.
    pub fn from_wire(value: &str) -> Option<Self> {
        let upper = value.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|s| s.as_str() == upper)
    }

    pub fn needs_attention(self) -> bool {
        matches!(
            self,
            SessionState::AwaitingPlanApproval | SessionState::AwaitingUserFeedback
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutomationMode {
    #[default]
    AutomationModeUnspecified,
    AutoCreatePr,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubRepoContext {
    #[serde(default)]
    pub starting_branch: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceContext {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo_context: Option<GithubRepoContext>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestOutput {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    #[serde(default)]
    pub pull_request: Option<PullRequestOutput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Resource name, `sessions/<id>`.
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub state: SessionState,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub update_time: Option<String>,
    #[serde(default)]
    pub source_context: SourceContext,
    #[serde(default)]
    pub require_plan_approval: Option<bool>,
    #[serde(default)]
    pub automation_mode: Option<AutomationMode>,
    #[serde(default)]
    pub outputs: Vec<SessionOutput>,
}

impl Session {
    /// URL of the first pull request the session produced.
    pub fn pull_request_url(&self) -> Option<&str> {
        self.outputs
            .iter()
            .find_map(|o| o.pull_request.as_ref())
            .map(|pr| pr.url.as_str())
    }

    /// Title if present, otherwise the id.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

/// Body of `POST /sessions`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub prompt: String,
    pub source_context: SourceContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub require_plan_approval: bool,
    pub automation_mode: AutomationMode,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsResponse {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Accept `123` or `sessions/123`.
pub fn session_resource_name(id_or_name: &str) -> String {
    let trimmed = id_or_name.trim().trim_matches('/');
    if trimmed.starts_with("sessions/") {
        trimmed.to_string()
    } else {
        format!("sessions/{}", trimmed)
    }
}
