mod activity;
mod client;
mod session;
mod source;

pub use activity::{
    latest_plan, Activity, AgentMessaged, Artifact, BashOutput, ChangeSet, GitPatch, Media, Plan,
    PlanApproved, PlanGenerated, PlanStep, ProgressUpdated, SessionCompleted, SessionFailed,
    UserMessaged,
};
pub use client::{
    fetch_all_activities, fetch_all_sources, ApiError, ClientConfig, JulesApi, JulesClient, Page,
    DEFAULT_ACTIVITY_PAGE_SIZE, DEFAULT_BASE_URL, DEFAULT_SESSION_PAGE_SIZE,
    DEFAULT_SOURCE_PAGE_SIZE,
};
pub use session::{
    session_resource_name, AutomationMode, GithubRepoContext, NewSession, PullRequestOutput,
    Session, SessionOutput, SessionState, SourceContext,
};
pub use source::{resolve_starting_branch, source_resource_name, Branch, GithubRepo, Source};
