use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
}

impl PlanStep {
    /// 1-based position, falling back to the list position.
    pub fn number(&self, position: usize) -> usize {
        self.index.map(|i| i as usize + 1).unwrap_or(position + 1)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub steps: Vec<PlanStep>,
    #[serde(default)]
    pub create_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessaged {
    #[serde(default)]
    pub agent_message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessaged {
    #[serde(default)]
    pub user_message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanGenerated {
    #[serde(default)]
    pub plan: Plan,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanApproved {
    #[serde(default)]
    pub plan_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdated {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCompleted {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFailed {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPatch {
    #[serde(default)]
    pub unidiff_patch: String,
    #[serde(default)]
    pub base_commit_id: Option<String>,
    #[serde(default)]
    pub suggested_commit_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub git_patch: Option<GitPatch>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    /// Base64-encoded payload.
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BashOutput {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default)]
    pub change_set: Option<ChangeSet>,
    #[serde(default)]
    pub media: Option<Media>,
    #[serde(default)]
    pub bash_output: Option<BashOutput>,
}

/// One timeline event of a session. At most one of the event fields is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub originator: Option<String>,
    #[serde(default)]
    pub agent_messaged: Option<AgentMessaged>,
    #[serde(default)]
    pub user_messaged: Option<UserMessaged>,
    #[serde(default)]
    pub plan_generated: Option<PlanGenerated>,
    #[serde(default)]
    pub plan_approved: Option<PlanApproved>,
    #[serde(default)]
    pub progress_updated: Option<ProgressUpdated>,
    #[serde(default)]
    pub session_completed: Option<SessionCompleted>,
    #[serde(default)]
    pub session_failed: Option<SessionFailed>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl Activity {
    pub fn is_message(&self) -> bool {
        self.user_messaged.is_some() || self.agent_messaged.is_some()
    }

    pub fn has_artifacts(&self) -> bool {
        !self.artifacts.is_empty()
    }

    /// Change sets that carry a patch.
    pub fn change_sets(&self) -> impl Iterator<Item = (&ChangeSet, &GitPatch)> {
        self.artifacts
            .iter()
            .filter_map(|a| a.change_set.as_ref())
            .filter_map(|cs| cs.git_patch.as_ref().map(|p| (cs, p)))
    }

    pub fn media(&self) -> impl Iterator<Item = &Media> {
        self.artifacts.iter().filter_map(|a| a.media.as_ref())
    }
}

/// The most recently generated plan in a timeline.
pub fn latest_plan(activities: &[Activity]) -> Option<&Plan> {
    activities
        .iter()
        .rev()
        .find_map(|a| a.plan_generated.as_ref())
        .map(|pg| &pg.plan)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListActivitiesResponse {
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}
