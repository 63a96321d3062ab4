use super::*;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Duration, TimeZone};

use crate::jules::{
    session_resource_name, Activity, AgentMessaged, ApiError, Artifact, AutomationMode, Branch,
    ChangeSet, GitPatch, GithubRepo, Media, NewSession, Page, Plan, PlanGenerated, PlanStep,
    ProgressUpdated, PullRequestOutput, SessionOutput, SessionState, Source, SourceContext,
    UserMessaged,
};
use crate::ui::{DetailView, Form, FormValues, ListView, Navigation};

#[derive(Default)]
struct FakeApi {
    sessions: Vec<Session>,
    activities: HashMap<String, Vec<Activity>>,
    sources: Vec<Source>,
    next_page_token: Option<String>,
    fail_approve: bool,
    sent: Mutex<Vec<(String, String)>>,
    approved: Mutex<Vec<String>>,
    created: Mutex<Vec<NewSession>>,
    source_calls: Mutex<usize>,
}

fn not_found(name: &str) -> ApiError {
    ApiError::Http {
        action: "get session".to_string(),
        status: 404,
        body: format!("{} not found", name),
    }
}

#[async_trait]
impl JulesApi for FakeApi {
    async fn list_sessions(
        &self,
        page_size: u32,
        _page_token: Option<&str>,
    ) -> Result<Page<Session>, ApiError> {
        let items = self.sessions.iter().take(page_size as usize).cloned().collect();
        Ok(Page::new(items, self.next_page_token.clone()))
    }

    async fn get_session(&self, session: &str) -> Result<Session, ApiError> {
        let name = session_resource_name(session);
        self.sessions
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| not_found(&name))
    }

    async fn create_session(&self, request: &NewSession) -> Result<Session, ApiError> {
        self.created.lock().unwrap().push(request.clone());
        Ok(Session {
            name: "sessions/99".to_string(),
            id: "99".to_string(),
            title: request.title.clone(),
            prompt: request.prompt.clone(),
            url: "https://jules.google.com/session/99".to_string(),
            ..Session::default()
        })
    }

    async fn list_activities(
        &self,
        session: &str,
        _page_size: u32,
        _page_token: Option<&str>,
    ) -> Result<Page<Activity>, ApiError> {
        let name = session_resource_name(session);
        let items = self.activities.get(&name).cloned().unwrap_or_default();
        Ok(Page::new(items, None))
    }

    async fn send_message(&self, session: &str, prompt: &str) -> Result<(), ApiError> {
        self.sent
            .lock()
            .unwrap()
            .push((session_resource_name(session), prompt.to_string()));
        Ok(())
    }

    async fn approve_plan(&self, session: &str) -> Result<(), ApiError> {
        if self.fail_approve {
            return Err(ApiError::Http {
                action: "approve plan".to_string(),
                status: 403,
                body: "denied".to_string(),
            });
        }
        self.approved.lock().unwrap().push(session_resource_name(session));
        Ok(())
    }

    async fn list_sources(
        &self,
        _page_size: u32,
        _page_token: Option<&str>,
    ) -> Result<Page<Source>, ApiError> {
        *self.source_calls.lock().unwrap() += 1;
        Ok(Page::new(self.sources.clone(), None))
    }
}

/// Keeps everything it is asked to show; forms are answered from `answers`.
#[derive(Default)]
struct RecordingPresenter {
    lists: Vec<ListView>,
    details: Vec<DetailView>,
    texts: Vec<String>,
    notices: Vec<Notice>,
    navigations: Vec<Navigation>,
    forms: Vec<Form>,
    answers: HashMap<&'static str, String>,
    cancel_forms: bool,
}

impl Presenter for RecordingPresenter {
    fn render_list(&mut self, view: &ListView) -> Result<()> {
        self.lists.push(view.clone());
        Ok(())
    }

    fn render_detail(&mut self, view: &DetailView) -> Result<()> {
        self.details.push(view.clone());
        Ok(())
    }

    fn render_text(&mut self, text: &str) -> Result<()> {
        self.texts.push(text.to_string());
        Ok(())
    }

    fn render_form(&mut self, form: &Form) -> Result<Option<FormValues>> {
        self.forms.push(form.clone());
        if self.cancel_forms {
            return Ok(None);
        }
        let mut values = FormValues::default();
        for field in &form.fields {
            let answer = self.answers.get(field.id).cloned().or_else(|| field.value.clone());
            if let Some(value) = answer {
                values.insert(field.id, value);
            }
        }
        form.validate(&values).map_err(anyhow::Error::msg)?;
        Ok(Some(values))
    }

    fn notify(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }

    fn navigate(&mut self, navigation: Navigation) {
        self.navigations.push(navigation);
    }
}

fn now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).single().unwrap()
}

fn session(id: &str, title: &str, state: SessionState, age: Duration) -> Session {
    Session {
        name: format!("sessions/{}", id),
        id: id.to_string(),
        title: Some(title.to_string()),
        prompt: format!("Prompt for {}", title),
        state,
        url: format!("https://jules.google.com/session/{}", id),
        create_time: (now() - age).to_rfc3339(),
        source_context: SourceContext {
            source: "sources/github/octo/repo".to_string(),
            github_repo_context: None,
        },
        ..Session::default()
    }
}

fn with_pr(mut session: Session, url: &str) -> Session {
    session.outputs = vec![SessionOutput {
        pull_request: Some(PullRequestOutput {
            url: url.to_string(),
            title: None,
            description: None,
        }),
    }];
    session
}

fn app(api: FakeApi) -> App<FakeApi, RecordingPresenter> {
    App::new(api, RecordingPresenter::default(), Config::default()).with_now(now())
}

fn message(id: &str, text: &str, from_user: bool) -> Activity {
    Activity {
        id: id.to_string(),
        name: format!("sessions/1/activities/{}", id),
        create_time: now().to_rfc3339(),
        user_messaged: from_user.then(|| UserMessaged {
            user_message: text.to_string(),
        }),
        agent_messaged: (!from_user).then(|| AgentMessaged {
            agent_message: text.to_string(),
        }),
        ..Activity::default()
    }
}

fn progress(id: &str, title: &str) -> Activity {
    Activity {
        id: id.to_string(),
        progress_updated: Some(ProgressUpdated {
            title: Some(title.to_string()),
            description: None,
        }),
        ..Activity::default()
    }
}

fn plan_activity(id: &str, titles: &[&str]) -> Activity {
    Activity {
        id: id.to_string(),
        plan_generated: Some(PlanGenerated {
            plan: Plan {
                id: format!("plan-{}", id),
                steps: titles
                    .iter()
                    .enumerate()
                    .map(|(i, t)| PlanStep {
                        id: i.to_string(),
                        title: t.to_string(),
                        description: Some(format!("Details for {}", t)),
                        index: Some(i as u32),
                    })
                    .collect(),
                create_time: None,
            },
        }),
        ..Activity::default()
    }
}

fn change_set_activity(id: &str, patch: &str, message: Option<&str>) -> Activity {
    Activity {
        id: id.to_string(),
        artifacts: vec![Artifact {
            change_set: Some(ChangeSet {
                source: "sources/github/octo/repo".to_string(),
                git_patch: Some(GitPatch {
                    unidiff_patch: patch.to_string(),
                    base_commit_id: Some("abc123".to_string()),
                    suggested_commit_message: message.map(str::to_string),
                }),
            }),
            ..Artifact::default()
        }],
        ..Activity::default()
    }
}

fn media_activity(id: &str, data: &str, mime: &str) -> Activity {
    Activity {
        id: id.to_string(),
        artifacts: vec![Artifact {
            media: Some(Media {
                data: data.to_string(),
                mime_type: mime.to_string(),
            }),
            ..Artifact::default()
        }],
        ..Activity::default()
    }
}

const LIB_PATCH: &str = concat!(
    "diff --git a/src/lib.rs b/src/lib.rs\n",
    "index 1111111..2222222 100644\n",
    "--- a/src/lib.rs\n",
    "+++ b/src/lib.rs\n",
    "@@ -1,2 +1,3 @@\n",
    " pub mod a;\n",
    "+pub mod b;\n",
    " pub mod c;\n",
);

const README_PATCH: &str = concat!(
    "diff --git a/README.md b/README.md\n",
    "new file mode 100644\n",
    "--- /dev/null\n",
    "+++ b/README.md\n",
    "@@ -0,0 +1 @@\n",
    "+# Title\n",
);

fn activities_for(session: &str, activities: Vec<Activity>) -> HashMap<String, Vec<Activity>> {
    HashMap::from([(session_resource_name(session), activities)])
}

#[tokio::test]
async fn test_sessions_grouped_by_day_with_page_hint() {
    let api = FakeApi {
        sessions: vec![
            session("1", "Fix parser", SessionState::Completed, Duration::hours(2)),
            session("2", "Add tests", SessionState::InProgress, Duration::days(1)),
            session("3", "Refactor", SessionState::Failed, Duration::days(3)),
            session("4", "Docs", SessionState::Completed, Duration::days(20)),
            session("5", "Ancient", SessionState::Completed, Duration::days(200)),
        ],
        next_page_token: Some("tok-2".to_string()),
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Sessions {
        filter: SessionFilter::All,
        page_size: None,
        page_token: None,
    })
    .await
    .unwrap();

    let view = &app.presenter().lists[0];
    let titles: Vec<&str> = view.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Today", "Yesterday", "This Week", "This Month", "Older"]);
    assert_eq!(view.sections[0].items[0].title, "Fix parser");
    assert_eq!(view.sections[0].items[0].subtitle.as_deref(), Some("octo/repo"));
    assert_eq!(view.sections[1].items[0].accessories[0], "In Progress");
    assert_eq!(
        view.footer.as_deref(),
        Some("More sessions: jules sessions --page-token tok-2")
    );
}

#[tokio::test]
async fn test_sessions_repo_filter_lists_known_repositories_when_empty() {
    let api = FakeApi {
        sessions: vec![session("1", "Fix", SessionState::Completed, Duration::hours(1))],
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Sessions {
        filter: "repo:other/thing".parse().unwrap(),
        page_size: Some(5),
        page_token: None,
    })
    .await
    .unwrap();

    let view = &app.presenter().lists[0];
    assert!(view.is_empty());
    assert_eq!(view.title, "Sessions (repo:other/thing)");
    assert_eq!(
        view.empty_message,
        "No sessions for other/thing. Repositories on this page: octo/repo"
    );
    assert!(view.footer.is_none());
}

#[tokio::test]
async fn test_show_lists_metadata_and_pr_actions() {
    let pr = "https://github.com/octo/repo/pull/7";
    let api = FakeApi {
        sessions: vec![with_pr(
            session("1", "Fix parser", SessionState::AwaitingPlanApproval, Duration::hours(1)),
            pr,
        )],
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Show {
        session: "sessions/1".to_string(),
    })
    .await
    .unwrap();

    let presenter = app.presenter();
    assert_eq!(presenter.navigations, vec![Navigation::Push("Fix parser".to_string())]);
    let view = &presenter.details[0];
    assert_eq!(view.markdown, "Prompt for Fix parser");
    let meta: Vec<(&str, &str)> = view
        .metadata
        .iter()
        .map(|m| (m.label.as_str(), m.value.as_str()))
        .collect();
    assert!(meta.contains(&("State", "Awaiting Plan Approval")));
    assert!(meta.contains(&("Pull Request", pr)));
    let actions: Vec<&str> = view.actions.iter().map(|a| a.value.as_str()).collect();
    assert!(actions.contains(&"jules approve 1"));
    assert!(actions.contains(&"gh pr merge --squash https://github.com/octo/repo/pull/7"));
}

#[tokio::test]
async fn test_unknown_session_is_reported_as_failure_notice() {
    let mut app = app(FakeApi::default());
    let err = app
        .run(Command::Show {
            session: "42".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to get session: 404 - sessions/42 not found");
    let notice = &app.presenter().notices[0];
    assert_eq!(notice.style, NoticeStyle::Failure);
    assert_eq!(notice.title, err.to_string());
}

#[tokio::test]
async fn test_activities_filter_keeps_timeline_numbers() {
    let api = FakeApi {
        activities: activities_for(
            "1",
            vec![
                message("a", "Please fix", true),
                progress("b", "Reading files"),
                message("c", "Done", false),
            ],
        ),
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Activities {
        session: "1".to_string(),
        filter: ActivityFilter::Messages,
        show: None,
        full: false,
    })
    .await
    .unwrap();

    let view = &app.presenter().lists[0];
    assert_eq!(view.sections[0].title, "Messages Only");
    let titles: Vec<&str> = view.sections[0].items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["1. User Message", "3. Agent Message"]);
}

#[tokio::test]
async fn test_activities_show_one_in_full() {
    let api = FakeApi {
        activities: activities_for("1", vec![message("a", "Please fix", true)]),
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Activities {
        session: "1".to_string(),
        filter: ActivityFilter::All,
        show: Some(1),
        full: false,
    })
    .await
    .unwrap();
    assert_eq!(app.presenter().details[0].title, "User Message");
    assert_eq!(app.presenter().details[0].markdown, "Please fix");

    let err = app
        .run(Command::Activities {
            session: "1".to_string(),
            filter: ActivityFilter::All,
            show: Some(5),
            full: false,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No activity 5 (session has 1)");
}

#[tokio::test]
async fn test_plan_uses_latest_generated_plan() {
    let api = FakeApi {
        activities: activities_for(
            "1",
            vec![
                plan_activity("p1", &["Old step"]),
                message("m", "Change it", true),
                plan_activity("p2", &["Read code", "Write fix"]),
            ],
        ),
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Plan {
        session: "1".to_string(),
        step: None,
    })
    .await
    .unwrap();

    let view = &app.presenter().details[0];
    assert_eq!(view.title, "Plan (2 steps)");
    insta::assert_snapshot!(view.markdown, @r"
    1. **Read code**
       Details for Read code

    2. **Write fix**
       Details for Write fix
    ");

    app.run(Command::Plan {
        session: "1".to_string(),
        step: Some(2),
    })
    .await
    .unwrap();
    assert_eq!(app.presenter().details[1].markdown, "## Write fix\n\nDetails for Write fix");
}

#[tokio::test]
async fn test_plan_missing_is_a_notice() {
    let api = FakeApi {
        activities: activities_for("1", vec![message("a", "hi", true)]),
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Plan {
        session: "1".to_string(),
        step: None,
    })
    .await
    .unwrap();
    assert!(app.presenter().details.is_empty());
    assert_eq!(app.presenter().notices[0].title, "No plan found");
}

#[tokio::test]
async fn test_approve_reports_progress_then_success() {
    let mut app = app(FakeApi::default());
    app.run(Command::Approve {
        session: "7".to_string(),
    })
    .await
    .unwrap();

    let styles: Vec<NoticeStyle> = app.presenter().notices.iter().map(|n| n.style).collect();
    assert_eq!(styles, vec![NoticeStyle::Animated, NoticeStyle::Success]);
    assert_eq!(*app.api.approved.lock().unwrap(), vec!["sessions/7".to_string()]);
}

#[tokio::test]
async fn test_approve_failure_carries_status_and_body() {
    let api = FakeApi {
        fail_approve: true,
        ..FakeApi::default()
    };
    let mut app = app(api);
    let result = app
        .run(Command::Approve {
            session: "7".to_string(),
        })
        .await;
    assert!(result.is_err());
    let last = app.presenter().notices.last().unwrap();
    assert_eq!(last.style, NoticeStyle::Failure);
    assert_eq!(last.title, "Failed to approve plan: 403 - denied");
}

#[tokio::test]
async fn test_decline_sends_reason_message() {
    let mut app = app(FakeApi::default());
    app.run(Command::Decline {
        session: "3".to_string(),
        reason: Some("Too risky".to_string()),
    })
    .await
    .unwrap();
    assert_eq!(
        *app.api.sent.lock().unwrap(),
        vec![(
            "sessions/3".to_string(),
            "I decline the plan. Reason: Too risky".to_string()
        )]
    );
}

#[tokio::test]
async fn test_send_without_message_fails_validation() {
    let mut app = app(FakeApi::default());
    let err = app
        .run(Command::Send {
            session: "3".to_string(),
            message: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Required: Message");
    assert!(app.api.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_uses_form_answer_and_cancel_sends_nothing() {
    let mut app = app(FakeApi::default());
    app.presenter.answers.insert("prompt", "  Looks good  ".to_string());
    app.run(Command::Send {
        session: "3".to_string(),
        message: None,
    })
    .await
    .unwrap();
    assert_eq!(app.api.sent.lock().unwrap()[0].1, "Looks good");
    assert_eq!(
        app.presenter().forms[0].fields[0].instructions[0],
        "Message to session: 3"
    );

    app.presenter.cancel_forms = true;
    app.run(Command::Send {
        session: "3".to_string(),
        message: None,
    })
    .await
    .unwrap();
    assert_eq!(app.api.sent.lock().unwrap().len(), 1);
    assert_eq!(app.presenter().notices.last().unwrap().title, "Message not sent");
}

fn repo_source(default_branch: &str) -> Source {
    Source {
        name: "sources/github/octo/repo".to_string(),
        id: "github/octo/repo".to_string(),
        github_repo: Some(GithubRepo {
            owner: "octo".to_string(),
            repo: "repo".to_string(),
            is_private: Some(true),
            default_branch: Some(Branch {
                display_name: default_branch.to_string(),
            }),
            branches: vec![
                Branch {
                    display_name: default_branch.to_string(),
                },
                Branch {
                    display_name: "feature".to_string(),
                },
            ],
        }),
    }
}

#[tokio::test]
async fn test_launch_defaults_to_source_branch() {
    let api = FakeApi {
        sources: vec![repo_source("develop")],
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Launch {
        source: "octo/repo".to_string(),
        branch: None,
        prompt: Some("Add a changelog".to_string()),
        title: None,
        require_plan_approval: true,
        auto_pr: true,
    })
    .await
    .unwrap();

    let created = app.api.created.lock().unwrap();
    let request = &created[0];
    assert_eq!(request.prompt, "Add a changelog");
    assert_eq!(request.source_context.source, "sources/github/octo/repo");
    assert_eq!(
        request
            .source_context
            .github_repo_context
            .as_ref()
            .unwrap()
            .starting_branch,
        "develop"
    );
    assert!(request.require_plan_approval);
    assert_eq!(request.automation_mode, AutomationMode::AutoCreatePr);
    assert!(request.title.is_none());
    assert_eq!(
        app.presenter().navigations,
        vec![Navigation::OpenUrl("https://jules.google.com/session/99".to_string())]
    );
}

#[tokio::test]
async fn test_launch_with_explicit_branch_skips_source_lookup() {
    let mut app = app(FakeApi::default());
    app.run(Command::Launch {
        source: "sources/github/octo/repo".to_string(),
        branch: Some("hotfix".to_string()),
        prompt: Some("Patch it".to_string()),
        title: Some("Hotfix".to_string()),
        require_plan_approval: false,
        auto_pr: false,
    })
    .await
    .unwrap();

    assert_eq!(*app.api.source_calls.lock().unwrap(), 0);
    let created = app.api.created.lock().unwrap();
    assert_eq!(
        created[0].automation_mode,
        AutomationMode::AutomationModeUnspecified
    );
    assert_eq!(created[0].title.as_deref(), Some("Hotfix"));
}

#[tokio::test]
async fn test_launch_unknown_source_falls_back_to_main() {
    let mut app = app(FakeApi::default());
    app.run(Command::Launch {
        source: "octo/missing".to_string(),
        branch: None,
        prompt: Some("Try".to_string()),
        title: None,
        require_plan_approval: false,
        auto_pr: false,
    })
    .await
    .unwrap();
    let created = app.api.created.lock().unwrap();
    let context = created[0].source_context.github_repo_context.as_ref().unwrap();
    assert_eq!(context.starting_branch, "main");
}

#[tokio::test]
async fn test_sources_list() {
    let api = FakeApi {
        sources: vec![repo_source("main")],
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Sources).await.unwrap();
    let item = &app.presenter().lists[0].sections[0].items[0];
    assert_eq!(item.title, "octo/repo");
    assert_eq!(item.subtitle.as_deref(), Some("main"));
    assert_eq!(item.accessories, vec!["2 branches", "private"]);
}

fn review_api() -> FakeApi {
    let both = format!("{}{}", LIB_PATCH, README_PATCH);
    FakeApi {
        sessions: vec![with_pr(
            session("1", "Fix parser", SessionState::Completed, Duration::hours(1)),
            "https://github.com/octo/repo/pull/7",
        )],
        activities: activities_for(
            "1",
            vec![
                change_set_activity("a", &both, Some("Add module b")),
                change_set_activity("b", "diff --git a/src/lib.rs b/src/lib.rs\n+later\n", None),
            ],
        ),
        ..FakeApi::default()
    }
}

#[tokio::test]
async fn test_review_page() {
    let mut app = app(review_api());
    app.run(Command::Review {
        session: "1".to_string(),
        file: None,
        full_diff: false,
    })
    .await
    .unwrap();

    let view = &app.presenter().details[0];
    assert_eq!(view.title, "Code Review: Fix parser");
    assert!(view.markdown.starts_with("## Suggested Commit Message\n\nAdd module b"));
    assert!(view.markdown.contains("## 2 Files Changed"));
    assert!(view.markdown.contains("### README.md [6 lines] · @@ -0,0 +1 @@"));
    // first change set wins for src/lib.rs
    assert!(!view.markdown.contains("+later"));
    let actions: Vec<&str> = view.actions.iter().map(|a| a.value.as_str()).collect();
    assert!(actions.contains(&"gh pr review --approve https://github.com/octo/repo/pull/7"));
    assert!(actions.contains(&"jules review 1 --full-diff"));
}

#[tokio::test]
async fn test_review_single_file_and_full_diff() {
    let mut app = app(review_api());
    app.run(Command::Review {
        session: "1".to_string(),
        file: Some("lib.rs".to_string()),
        full_diff: false,
    })
    .await
    .unwrap();
    let view = &app.presenter().details[0];
    assert!(view.title.starts_with("src/lib.rs [8 lines]"));
    assert_eq!(view.actions[0].value, "git diff abc123 -- src/lib.rs");

    app.run(Command::Review {
        session: "1".to_string(),
        file: None,
        full_diff: true,
    })
    .await
    .unwrap();
    assert_eq!(app.presenter().texts[0], format!("{}{}", README_PATCH, LIB_PATCH));
}

#[tokio::test]
async fn test_review_unknown_file_lists_changed_files() {
    let mut app = app(review_api());
    let err = app
        .run(Command::Review {
            session: "1".to_string(),
            file: Some("main.rs".to_string()),
            full_diff: false,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "No changed file matching 'main.rs'. Changed files: README.md, src/lib.rs"
    );
}

#[test]
fn test_patch_records_and_list() {
    let mut app = app(FakeApi::default());
    let raw = format!("{}{}", LIB_PATCH, README_PATCH);
    let records = changes::PatchOptions {
        source: "local".to_string(),
        base: Some("abc123".to_string()),
        message: None,
        records: true,
    };
    app.patch(&raw, &records).unwrap();
    let json: serde_json::Value = serde_json::from_str(&app.presenter().texts[0]).unwrap();
    assert_eq!(json[0]["filename"], "src/lib.rs");
    assert_eq!(json[1]["filename"], "README.md");
    assert_eq!(json[1]["status"], "added");
    assert_eq!(json[0]["git_diff_command"], "git diff abc123 -- src/lib.rs");

    let list = changes::PatchOptions {
        records: false,
        base: None,
        ..records
    };
    app.patch(&raw, &list).unwrap();
    let view = &app.presenter().lists[0];
    assert_eq!(view.title, "2 files changed");
    let first = &view.sections[0].items[0];
    assert_eq!(first.subtitle.as_deref(), Some("modified"));
    assert_eq!(first.accessories, vec!["+1 -0", "· @@ -1,2 +1,3 @@"]);

    app.patch("", &list).unwrap();
    assert!(app.presenter().lists[1].is_empty());
}

#[tokio::test]
async fn test_media_list_and_save() {
    let encoded = STANDARD.encode(b"png-bytes");
    let api = FakeApi {
        activities: activities_for(
            "1",
            vec![
                media_activity("a", &encoded, "image/png"),
                message("b", "no media", false),
                media_activity("c", &STANDARD.encode(b"<svg/>"), "image/svg+xml"),
            ],
        ),
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Media {
        session: "sessions/1".to_string(),
        save: false,
        save_dir: None,
    })
    .await
    .unwrap();
    let view = &app.presenter().lists[0];
    assert_eq!(view.item_count(), 2);
    assert_eq!(view.footer.as_deref(), Some("Save with: jules media 1 --save"));

    let dir = tempfile::tempdir().unwrap();
    app.run(Command::Media {
        session: "sessions/1".to_string(),
        save: false,
        save_dir: Some(dir.path().to_path_buf()),
    })
    .await
    .unwrap();

    let stamp = now().timestamp_millis();
    let png = dir.path().join(format!("1-{}-1.png", stamp));
    let svg = dir.path().join(format!("1-{}-2.svg", stamp));
    assert_eq!(std::fs::read(&png).unwrap(), b"png-bytes");
    assert_eq!(std::fs::read(&svg).unwrap(), b"<svg/>");
    assert_eq!(app.presenter().notices[0].title, "Saved 2 media files");
}

#[tokio::test]
async fn test_status_counts_recent_sessions_needing_attention() {
    let api = FakeApi {
        sessions: vec![
            session("1", "Plan me", SessionState::AwaitingPlanApproval, Duration::hours(1)),
            session("2", "Answer me", SessionState::AwaitingUserFeedback, Duration::days(1)),
            session("3", "Done", SessionState::Completed, Duration::days(2)),
            session("4", "Stale", SessionState::AwaitingPlanApproval, Duration::days(40)),
        ],
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Status).await.unwrap();

    let view = &app.presenter().lists[0];
    assert_eq!(view.item_count(), 3);
    assert_eq!(view.footer.as_deref(), Some("2 sessions need attention"));
    assert_eq!(view.sections[0].items[0].accessories[0], "Status: Needs Attention");
}

#[tokio::test]
async fn test_digest_omits_artifact_bodies() {
    let api = FakeApi {
        activities: activities_for(
            "1",
            vec![
                message("a", "Please fix", true),
                change_set_activity("b", LIB_PATCH, None),
            ],
        ),
        ..FakeApi::default()
    };
    let mut app = app(api);
    app.run(Command::Digest {
        session: "1".to_string(),
        max_chars: DIGEST_MAX_CHARS,
    })
    .await
    .unwrap();
    let digest = &app.presenter().texts[0];
    assert!(digest.starts_with("Please fix\n\n---\n\n"));
    assert!(digest.contains("_Git patch omitted_"));
    assert!(!digest.contains("pub mod b"));
}
