//! Text helpers shared by every view: titles, state labels, date buckets and
//! the markdown rendering of activities and plans.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::jules::{Activity, BashOutput, Plan, PlanStep, Session, SessionState};

pub const DEFAULT_TITLE_LENGTH: usize = 50;
pub const DIGEST_MAX_CHARS: usize = 25_000;
const DIGEST_TRUNCATED_PREFIX: &str = "... (older activities truncated)\n\n";
const ACTIVITY_SEPARATOR: &str = "\n\n---\n\n";
const PLAN_PREVIEW_STEPS: usize = 4;

/// First line of the title (or id), cut to `max_len` characters.
pub fn format_session_title(session: &Session, max_len: usize) -> String {
    let raw = session
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(&session.id);
    let first_line = raw.lines().next().unwrap_or("").trim();
    truncate_chars(first_line, max_len)
}

/// Cut to `max_len` characters, appending `...` when anything was dropped.
pub fn truncate_chars(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub fn format_session_state(state: SessionState) -> &'static str {
    match state {
        SessionState::StateUnspecified => "Unspecified",
        SessionState::Queued => "Queued",
        SessionState::Planning => "Planning",
        SessionState::AwaitingPlanApproval => "Awaiting Plan Approval",
        SessionState::AwaitingUserFeedback => "Awaiting User Feedback",
        SessionState::InProgress => "In Progress",
        SessionState::Paused => "Paused",
        SessionState::Failed => "Failed",
        SessionState::Completed => "Completed",
        SessionState::Unknown => "Unknown",
    }
}

/// Coarse status class used for list glyphs and colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMarker {
    Running,
    Completed,
    Failed,
    Pending,
    NeedsAttention,
    Unknown,
}

impl StateMarker {
    pub fn glyph(self) -> &'static str {
        match self {
            StateMarker::Running => "◌",
            StateMarker::Completed => "✔",
            StateMarker::Failed => "✘",
            StateMarker::Pending => "○",
            StateMarker::NeedsAttention => "!",
            StateMarker::Unknown => "·",
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            StateMarker::Running => "Status: Running",
            StateMarker::Completed => "Status: Completed",
            StateMarker::Failed => "Status: Failed",
            StateMarker::Pending => "Status: Planning/Queued",
            StateMarker::NeedsAttention => "Status: Needs Attention",
            StateMarker::Unknown => "Status: Unknown",
        }
    }
}

pub fn state_marker(state: SessionState) -> StateMarker {
    match state {
        SessionState::InProgress => StateMarker::Running,
        SessionState::Completed => StateMarker::Completed,
        SessionState::Failed => StateMarker::Failed,
        SessionState::Planning | SessionState::Queued => StateMarker::Pending,
        SessionState::AwaitingPlanApproval | SessionState::AwaitingUserFeedback => {
            StateMarker::NeedsAttention
        }
        _ => StateMarker::Unknown,
    }
}

pub fn format_repo_name(source: &str) -> &str {
    source.strip_prefix("sources/github/").unwrap_or(source)
}

/// A GitHub pull request parsed from its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRef {
    pub owner: String,
    pub name: String,
    pub number: String,
}

/// Recognizes `https://github.com/<owner>/<name>/pull/<n>`.
pub fn extract_pr(url: &str) -> Option<PrRef> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let path_end = rest.find(['?', '#']).unwrap_or(rest.len());
    let parts: Vec<&str> = rest[..path_end].split('/').collect();
    match parts.as_slice() {
        ["github.com", owner, name, "pull", number, ..] if !number.is_empty() => Some(PrRef {
            owner: owner.to_string(),
            name: name.to_string(),
            number: number.to_string(),
        }),
        _ => None,
    }
}

pub fn format_pr_title(url: &str) -> String {
    match extract_pr(url) {
        Some(pr) => format!("PR {}", pr.number),
        None => url.to_string(),
    }
}

pub fn format_pr_subtitle(url: &str) -> Option<String> {
    extract_pr(url).map(|pr| format!("{}/{}", pr.owner, pr.name))
}

pub fn ensure_protocol(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

pub fn parse_time(value: &str) -> Option<DateTime<Local>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Local))
}

/// `Tuesday 14 October 2026 at 08:00`.
pub fn format_created_time(value: &str) -> Option<String> {
    parse_time(value).map(|t| t.format("%A %-d %B %Y at %H:%M").to_string())
}

/// `HH:MM`, or the raw value when it does not parse.
pub fn format_clock(value: &str) -> String {
    parse_time(value)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

#[derive(Debug, Default)]
pub struct SessionGroups<'a> {
    pub today: Vec<&'a Session>,
    pub yesterday: Vec<&'a Session>,
    pub this_week: Vec<&'a Session>,
    pub this_month: Vec<&'a Session>,
    pub older: Vec<&'a Session>,
}

impl<'a> SessionGroups<'a> {
    /// Non-empty buckets in display order.
    pub fn sections(&self) -> Vec<(&'static str, &[&'a Session])> {
        [
            ("Today", self.today.as_slice()),
            ("Yesterday", self.yesterday.as_slice()),
            ("This Week", self.this_week.as_slice()),
            ("This Month", self.this_month.as_slice()),
            ("Older", self.older.as_slice()),
        ]
        .into_iter()
        .filter(|(_, sessions)| !sessions.is_empty())
        .collect()
    }

    /// Sessions from today, yesterday and this week.
    pub fn recent(&self) -> impl Iterator<Item = &&'a Session> {
        self.today
            .iter()
            .chain(self.yesterday.iter())
            .chain(self.this_week.iter())
    }
}

/// Bucket sessions by calendar day relative to `now`, in `now`'s timezone.
pub fn group_sessions<'a, Tz: TimeZone>(
    sessions: &'a [Session],
    now: &DateTime<Tz>,
) -> SessionGroups<'a> {
    let tz = now.timezone();
    let today = now.date_naive();
    let yesterday = today.pred_opt().unwrap_or(today);
    let start_of_today = start_of_day(&tz, today).unwrap_or_else(|| now.clone());
    let week_start = start_of_today.clone() - Duration::days(7);
    let month_start = start_of_today - Duration::days(30);

    let mut groups = SessionGroups::default();
    for session in sessions {
        let Some(created) = DateTime::parse_from_rfc3339(&session.create_time)
            .ok()
            .map(|t| t.with_timezone(&tz))
        else {
            groups.older.push(session);
            continue;
        };
        let day = created.date_naive();
        if day == today {
            groups.today.push(session);
        } else if day == yesterday {
            groups.yesterday.push(session);
        } else if created >= week_start {
            groups.this_week.push(session);
        } else if created >= month_start {
            groups.this_month.push(session);
        } else {
            groups.older.push(session);
        }
    }
    groups
}

fn start_of_day<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> Option<DateTime<Tz>> {
    let midnight = day.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight).earliest()
}

/// Fence `content` with enough backticks that it cannot close the block.
pub fn fence(content: &str, lang: &str) -> String {
    let longest_run = content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let ticks = "`".repeat(longest_run.max(2) + 1);
    let body = content.strip_suffix('\n').unwrap_or(content);
    format!("{ticks}{lang}\n{body}\n{ticks}")
}

pub fn activity_title(activity: &Activity) -> String {
    if activity.user_messaged.is_some() {
        "User Message".to_string()
    } else if activity.agent_messaged.is_some() {
        "Agent Message".to_string()
    } else if activity.plan_generated.is_some() {
        "Plan Generated".to_string()
    } else if activity.plan_approved.is_some() {
        "Plan Approved".to_string()
    } else if let Some(progress) = &activity.progress_updated {
        progress
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Progress Update".to_string())
    } else if activity.session_completed.is_some() {
        "Session Completed".to_string()
    } else if let Some(failed) = &activity.session_failed {
        format!(
            "Session Failed: {}",
            failed
                .reason
                .as_deref()
                .filter(|r| !r.is_empty())
                .unwrap_or("Unknown reason")
        )
    } else {
        activity
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "Activity".to_string())
    }
}

/// Markdown body of one activity. Without `full_artifacts`, patches, media
/// and command output are replaced by short notes.
pub fn activity_markdown(activity: &Activity, full_artifacts: bool) -> String {
    let mut content = if let Some(m) = &activity.user_messaged {
        m.user_message.clone()
    } else if let Some(m) = &activity.agent_messaged {
        m.agent_message.clone()
    } else if let Some(pg) = &activity.plan_generated {
        plan_preview(&pg.plan)
    } else if let Some(progress) = &activity.progress_updated {
        progress.description.clone().unwrap_or_default()
    } else if let Some(failed) = &activity.session_failed {
        failed.reason.clone().unwrap_or_default()
    } else {
        activity.description.clone().unwrap_or_default()
    };

    if activity.artifacts.is_empty() {
        return content;
    }

    content.push_str("\n\n### Artifacts\n");
    for artifact in &activity.artifacts {
        if let Some(change_set) = &artifact.change_set {
            content.push_str(&format!("\n**Change Set**: {}\n", change_set.source));
            if let Some(patch) = &change_set.git_patch {
                if full_artifacts {
                    content.push('\n');
                    content.push_str(&fence(&patch.unidiff_patch, "diff"));
                    content.push('\n');
                } else {
                    content.push_str("\n_Git patch omitted_\n");
                }
            }
        }
        if let Some(media) = &artifact.media {
            if full_artifacts {
                content.push_str(&format!(
                    "\n![Media](data:{};base64,{})\n",
                    media.mime_type, media.data
                ));
            } else {
                content.push_str(&format!(
                    "\n_Media artifact ({}) omitted_\n",
                    media.mime_type
                ));
            }
        }
        if let Some(bash) = &artifact.bash_output {
            content.push_str(&bash_output_markdown(bash, full_artifacts));
        }
    }
    content
}

fn bash_output_markdown(bash: &BashOutput, full_output: bool) -> String {
    let mut out = format!("\n**Command**: `{}`\n", bash.command);
    if full_output {
        if !bash.output.is_empty() {
            out.push('\n');
            out.push_str(&fence(&bash.output, ""));
            out.push('\n');
        }
    } else {
        out.push_str("\n_Command output omitted_\n");
    }
    if let Some(code) = bash.exit_code {
        out.push_str(&format!("\n_Exit code: {}_\n", code));
    }
    out
}

fn plan_preview(plan: &Plan) -> String {
    let mut out = format!("**Plan with {} steps:**\n\n", plan.steps.len());
    for (i, step) in plan.steps.iter().take(PLAN_PREVIEW_STEPS).enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, step.title));
    }
    if plan.steps.len() > PLAN_PREVIEW_STEPS {
        out.push_str(&format!(
            "\n_...and {} more steps_",
            plan.steps.len() - PLAN_PREVIEW_STEPS
        ));
    }
    out
}

/// Whole plan as a numbered markdown list.
pub fn plan_markdown(plan: &Plan) -> String {
    plan.steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            format!(
                "{}. **{}**\n   {}",
                i + 1,
                step.title,
                step.description.as_deref().unwrap_or("")
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn plan_step_markdown(step: &PlanStep) -> String {
    format!(
        "## {}\n\n{}",
        step.title,
        step.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("_No description_")
    )
}

/// Whole timeline as markdown, every artifact body included.
pub fn activity_log(activities: &[Activity]) -> String {
    activities
        .iter()
        .map(|a| activity_markdown(a, true))
        .collect::<Vec<_>>()
        .join(ACTIVITY_SEPARATOR)
}

/// Compact timeline text for summarization. Keeps the newest `max_chars`
/// characters when the log is longer.
pub fn session_digest(activities: &[Activity], max_chars: usize) -> String {
    let content = activities
        .iter()
        .map(|a| activity_markdown(a, false))
        .collect::<Vec<_>>()
        .join(ACTIVITY_SEPARATOR);

    let total = content.chars().count();
    if total <= max_chars {
        return content;
    }
    let skip = total - max_chars;
    let start = content
        .char_indices()
        .nth(skip)
        .map(|(idx, _)| idx)
        .unwrap_or(content.len());
    format!("{}{}", DIGEST_TRUNCATED_PREFIX, &content[start..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jules::{
        AgentMessaged, Artifact, ChangeSet, GitPatch, Media, PlanGenerated, ProgressUpdated,
        SessionFailed, UserMessaged,
    };
    use chrono::Utc;
    use insta::assert_snapshot;

    fn session(id: &str, create_time: &str) -> Session {
        Session {
            name: format!("sessions/{}", id),
            id: id.to_string(),
            create_time: create_time.to_string(),
            ..Session::default()
        }
    }

    fn plan(steps: usize) -> Plan {
        Plan {
            id: "p".to_string(),
            steps: (0..steps)
                .map(|i| PlanStep {
                    id: format!("s{}", i),
                    title: format!("Step {}", i + 1),
                    description: (i % 2 == 0).then(|| format!("Do thing {}", i + 1)),
                    index: Some(i as u32),
                })
                .collect(),
            create_time: None,
        }
    }

    #[test]
    fn test_format_session_title() {
        let mut s = session("42", "");
        assert_eq!(format_session_title(&s, 50), "42");

        s.title = Some("  Fix the flaky test\nwith more detail".to_string());
        assert_eq!(format_session_title(&s, 50), "Fix the flaky test");
        assert_eq!(format_session_title(&s, 7), "Fix the...");
    }

    #[test]
    fn test_truncate_chars_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語...");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }

    #[test]
    fn test_state_labels_and_markers() {
        assert_eq!(format_session_state(SessionState::InProgress), "In Progress");
        assert_eq!(
            format_session_state(SessionState::AwaitingPlanApproval),
            "Awaiting Plan Approval"
        );
        assert_eq!(state_marker(SessionState::Queued), StateMarker::Pending);
        assert_eq!(
            state_marker(SessionState::AwaitingUserFeedback),
            StateMarker::NeedsAttention
        );
        assert_eq!(state_marker(SessionState::Paused), StateMarker::Unknown);
        assert_eq!(StateMarker::Failed.tooltip(), "Status: Failed");
    }

    #[test]
    fn test_format_repo_name() {
        assert_eq!(format_repo_name("sources/github/octo/repo"), "octo/repo");
        assert_eq!(format_repo_name("octo/repo"), "octo/repo");
    }

    #[test]
    fn test_extract_pr() {
        let pr = extract_pr("https://github.com/octo/repo/pull/17").unwrap();
        assert_eq!(pr.owner, "octo");
        assert_eq!(pr.name, "repo");
        assert_eq!(pr.number, "17");
        assert!(extract_pr("https://github.com/octo/repo/pull/17/files?x=1").is_some());
        assert!(extract_pr("https://gitlab.com/octo/repo/pull/17").is_none());
        assert!(extract_pr("https://github.com/octo/repo/issues/17").is_none());
        assert!(extract_pr("not a url").is_none());

        assert_eq!(format_pr_title("https://github.com/octo/repo/pull/17"), "PR 17");
        assert_eq!(format_pr_title("https://example.com/x"), "https://example.com/x");
        assert_eq!(
            format_pr_subtitle("https://github.com/octo/repo/pull/17").as_deref(),
            Some("octo/repo")
        );
    }

    #[test]
    fn test_ensure_protocol() {
        assert_eq!(ensure_protocol("jules.google.com/s/1"), "https://jules.google.com/s/1");
        assert_eq!(ensure_protocol("http://x"), "http://x");
    }

    #[test]
    fn test_group_sessions() {
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 15, 0, 0).unwrap();
        let sessions = vec![
            session("today", "2026-10-14T00:30:00Z"),
            session("yesterday", "2026-10-13T23:59:00Z"),
            session("week", "2026-10-07T00:00:00Z"),
            session("month", "2026-10-06T23:00:00Z"),
            session("month-edge", "2026-09-14T00:00:00Z"),
            session("old", "2026-09-13T23:59:59Z"),
            session("garbage", "last tuesday"),
        ];
        let groups = group_sessions(&sessions, &now);
        let ids = |v: &[&Session]| v.iter().map(|s| s.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(&groups.today), vec!["today"]);
        assert_eq!(ids(&groups.yesterday), vec!["yesterday"]);
        assert_eq!(ids(&groups.this_week), vec!["week"]);
        assert_eq!(ids(&groups.this_month), vec!["month", "month-edge"]);
        assert_eq!(ids(&groups.older), vec!["old", "garbage"]);
        assert_eq!(groups.recent().count(), 3);

        let labels: Vec<&str> = groups.sections().iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec!["Today", "Yesterday", "This Week", "This Month", "Older"]
        );
    }

    #[test]
    fn test_group_sessions_skips_empty_sections() {
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 15, 0, 0).unwrap();
        let sessions = vec![session("a", "2026-10-14T09:00:00Z")];
        let groups = group_sessions(&sessions, &now);
        assert_eq!(groups.sections().len(), 1);
    }

    #[test]
    fn test_fence_widens_for_backticks() {
        assert_eq!(fence("+x\n", "diff"), "```diff\n+x\n```");
        assert_eq!(fence("+ ```rust\n", "diff"), "````diff\n+ ```rust\n````");
    }

    #[test]
    fn test_activity_titles() {
        let mut a = Activity::default();
        assert_eq!(activity_title(&a), "Activity");

        a.progress_updated = Some(ProgressUpdated::default());
        assert_eq!(activity_title(&a), "Progress Update");

        a.progress_updated = None;
        a.session_failed = Some(SessionFailed { reason: None });
        assert_eq!(activity_title(&a), "Session Failed: Unknown reason");

        a.user_messaged = Some(UserMessaged {
            user_message: "hi".to_string(),
        });
        assert_eq!(activity_title(&a), "User Message");
    }

    #[test]
    fn test_plan_preview_lists_four_steps() {
        let activity = Activity {
            plan_generated: Some(PlanGenerated { plan: plan(6) }),
            ..Activity::default()
        };
        assert_snapshot!(activity_markdown(&activity, true), @r"
        **Plan with 6 steps:**

        1. Step 1
        2. Step 2
        3. Step 3
        4. Step 4

        _...and 2 more steps_
        ");
    }

    #[test]
    fn test_plan_markdown() {
        assert_snapshot!(plan_markdown(&plan(2)), @r"
        1. **Step 1**
           Do thing 1

        2. **Step 2**
        ");
    }

    #[test]
    fn test_plan_step_markdown() {
        let p = plan(2);
        assert_eq!(plan_step_markdown(&p.steps[0]), "## Step 1\n\nDo thing 1");
        assert_eq!(plan_step_markdown(&p.steps[1]), "## Step 2\n\n_No description_");
    }

    fn artifact_activity() -> Activity {
        Activity {
            agent_messaged: Some(AgentMessaged {
                agent_message: "Done.".to_string(),
            }),
            artifacts: vec![
                Artifact {
                    change_set: Some(ChangeSet {
                        source: "sources/github/octo/repo".to_string(),
                        git_patch: Some(GitPatch {
                            unidiff_patch: "+added\n".to_string(),
                            ..GitPatch::default()
                        }),
                    }),
                    ..Artifact::default()
                },
                Artifact {
                    media: Some(Media {
                        data: "aGk=".to_string(),
                        mime_type: "image/png".to_string(),
                    }),
                    ..Artifact::default()
                },
                Artifact {
                    bash_output: Some(BashOutput {
                        command: "cargo test".to_string(),
                        output: "ok\n".to_string(),
                        exit_code: Some(0),
                    }),
                    ..Artifact::default()
                },
            ],
            ..Activity::default()
        }
    }

    #[test]
    fn test_activity_markdown_full_artifacts() {
        assert_snapshot!(activity_markdown(&artifact_activity(), true), @r"
        Done.

        ### Artifacts

        **Change Set**: sources/github/octo/repo

        ```diff
        +added
        ```

        ![Media](data:image/png;base64,aGk=)

        **Command**: `cargo test`

        ```
        ok
        ```

        _Exit code: 0_
        ");
    }

    #[test]
    fn test_activity_markdown_omits_artifacts() {
        assert_snapshot!(activity_markdown(&artifact_activity(), false), @r"
        Done.

        ### Artifacts

        **Change Set**: sources/github/octo/repo

        _Git patch omitted_

        _Media artifact (image/png) omitted_

        **Command**: `cargo test`

        _Command output omitted_

        _Exit code: 0_
        ");
    }

    #[test]
    fn test_session_digest_keeps_newest() {
        let activities: Vec<Activity> = (0..50)
            .map(|i| Activity {
                user_messaged: Some(UserMessaged {
                    user_message: format!("message {:02} {}", i, "x".repeat(20)),
                }),
                ..Activity::default()
            })
            .collect();

        let full = session_digest(&activities, usize::MAX);
        assert!(full.starts_with("message 00"));
        assert_eq!(full.matches("\n\n---\n\n").count(), 49);

        let digest = session_digest(&activities, 200);
        assert!(digest.starts_with("... (older activities truncated)\n\n"));
        assert!(digest.ends_with("message 49 xxxxxxxxxxxxxxxxxxxx"));
        assert!(!digest.contains("message 00"));
        assert_eq!(
            digest.chars().count(),
            200 + "... (older activities truncated)\n\n".len()
        );
    }

    #[test]
    fn test_activity_log_includes_patches() {
        let log = activity_log(&[artifact_activity(), Activity::default()]);
        assert!(log.contains("```diff\n+added\n```"));
        assert!(log.ends_with("\n\n---\n\n"));
    }
}
