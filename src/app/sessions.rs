use anyhow::{Context, Result};

use super::{session_id, session_label, App};
use crate::editor::{decline_instructions, message_instructions, prompt_instructions};
use crate::filter::{matched_indices, repositories, ActivityFilter, SessionFilter};
use crate::format::{
    activity_log, activity_markdown, activity_title, ensure_protocol, format_clock,
    format_created_time, format_pr_title, format_repo_name, format_session_state, group_sessions,
    plan_markdown, plan_step_markdown, state_marker,
};
use crate::jules::{
    fetch_all_activities, fetch_all_sources, latest_plan, resolve_starting_branch,
    source_resource_name, Activity, AutomationMode, GithubRepoContext, JulesApi, NewSession,
    Session, SessionState, Source, SourceContext, DEFAULT_SOURCE_PAGE_SIZE,
};
use crate::review::{approve_pr_command, merge_pr_command};
use crate::ui::{
    DetailView, FieldKind, Form, FormField, ListItem, ListSection, ListView, Navigation, Notice,
    Presenter,
};

pub(super) struct LaunchOptions {
    pub source: String,
    pub branch: Option<String>,
    pub prompt: Option<String>,
    pub title: Option<String>,
    pub require_plan_approval: bool,
    pub auto_pr: bool,
}

fn session_item(session: &Session) -> ListItem {
    let mut accessories = vec![format_session_state(session.state).to_string()];
    if let Some(url) = session.pull_request_url() {
        accessories.push(format_pr_title(url));
    }
    accessories.push(format_clock(&session.create_time));

    let repo = format_repo_name(&session.source_context.source);
    ListItem {
        id: session.id.clone(),
        title: session_label(session),
        subtitle: (!repo.is_empty()).then(|| repo.to_string()),
        accessories,
        marker: Some(state_marker(session.state)),
    }
}

fn activity_item(number: usize, activity: &Activity) -> ListItem {
    let mut accessories = vec![format_clock(&activity.create_time)];
    if activity.has_artifacts() {
        accessories.push(format!("{} artifacts", activity.artifacts.len()));
    }
    ListItem {
        id: number.to_string(),
        title: format!("{}. {}", number, activity_title(activity)),
        subtitle: activity.originator.clone().filter(|o| !o.is_empty()),
        accessories,
        marker: None,
    }
}

fn source_item(source: &Source) -> ListItem {
    let title = match &source.github_repo {
        Some(repo) if !repo.owner.is_empty() => format!("{}/{}", repo.owner, repo.repo),
        _ => format_repo_name(&source.name).to_string(),
    };
    let mut accessories = Vec::new();
    let branches = source.branch_names().len();
    if branches > 0 {
        accessories.push(format!("{} branches", branches));
    }
    if source.github_repo.as_ref().and_then(|r| r.is_private) == Some(true) {
        accessories.push("private".to_string());
    }
    ListItem {
        id: source.name.clone(),
        title,
        subtitle: source.default_branch().map(str::to_string),
        accessories,
        marker: None,
    }
}

impl<A: JulesApi, P: Presenter> App<A, P> {
    pub(super) async fn all_activities(&self, session: &str) -> Result<Vec<Activity>> {
        let activities =
            fetch_all_activities(&self.api, session, self.config.list.activity_page_size).await?;
        tracing::debug!(session, count = activities.len(), "fetched activities");
        Ok(activities)
    }

    pub(super) async fn sessions(
        &mut self,
        filter: &SessionFilter,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<()> {
        let page_size = page_size.unwrap_or(self.config.list.session_page_size);
        let page = self.api.list_sessions(page_size, page_token).await?;

        let matching: Vec<Session> = filter.apply(&page.items).into_iter().cloned().collect();
        let groups = group_sessions(&matching, &self.now);
        let sections = groups
            .sections()
            .into_iter()
            .map(|(title, sessions)| ListSection {
                title: title.to_string(),
                items: sessions.iter().map(|s| session_item(s)).collect(),
            })
            .collect();

        let empty_message = match filter {
            SessionFilter::Repo(repo) => {
                let known = repositories(&page.items);
                if known.is_empty() {
                    format!("No sessions for {}", repo)
                } else {
                    format!("No sessions for {}. Repositories on this page: {}", repo, known.join(", "))
                }
            }
            _ => "No sessions found".to_string(),
        };
        let title = match filter {
            SessionFilter::All => "Sessions".to_string(),
            other => format!("Sessions ({})", other),
        };

        let view = ListView {
            title,
            sections,
            empty_message,
            footer: page
                .next_page_token
                .map(|token| format!("More sessions: jules sessions --page-token {}", token)),
        };
        self.presenter.render_list(&view)
    }

    pub(super) async fn show(&mut self, session: &str) -> Result<()> {
        let session = self.api.get_session(session).await?;
        let id = session.id.clone();
        self.presenter.navigate(Navigation::Push(session_label(&session)));

        let mut view = DetailView::new(session.display_title(), session.prompt.clone())
            .meta("State", format_session_state(session.state))
            .meta("Repository", format_repo_name(&session.source_context.source));
        if let Some(context) = &session.source_context.github_repo_context {
            view = view.meta("Branch", context.starting_branch.clone());
        }
        let created = format_created_time(&session.create_time)
            .unwrap_or_else(|| session.create_time.clone());
        view = view.meta("Created", created);
        if let Some(updated) = session.update_time.as_deref() {
            view = view.meta(
                "Updated",
                format_created_time(updated).unwrap_or_else(|| updated.to_string()),
            );
        }
        if !session.url.is_empty() {
            view = view.meta("URL", ensure_protocol(&session.url));
        }

        if session.state == SessionState::AwaitingPlanApproval {
            view = view
                .action("Review plan", format!("jules plan {}", id))
                .action("Approve plan", format!("jules approve {}", id));
        }
        if session.state.needs_attention() {
            view = view.action("Reply", format!("jules send {}", id));
        }
        view = view
            .action("Activities", format!("jules activities {}", id))
            .action("Code review", format!("jules review {}", id));
        if let Some(url) = session.pull_request_url() {
            view = view
                .meta("Pull Request", url)
                .action("Approve PR", approve_pr_command(url))
                .action("Merge PR", merge_pr_command(url));
        }
        self.presenter.render_detail(&view)
    }

    pub(super) async fn activities(
        &mut self,
        session: &str,
        filter: ActivityFilter,
        show: Option<usize>,
        full: bool,
    ) -> Result<()> {
        let activities = self.all_activities(session).await?;

        if let Some(number) = show {
            let activity = number
                .checked_sub(1)
                .and_then(|i| activities.get(i))
                .with_context(|| {
                    format!("No activity {} (session has {})", number, activities.len())
                })?;
            let view = DetailView::new(activity_title(activity), activity_markdown(activity, true))
                .meta("Created", format_clock(&activity.create_time));
            return self.presenter.render_detail(&view);
        }

        // Numbers refer to the unfiltered timeline so `--show` works on them.
        let indices = matched_indices(&activities, |a| filter.matches(a));
        if full {
            let selected: Vec<Activity> =
                indices.iter().map(|&i| activities[i].clone()).collect();
            let view = DetailView::new(filter.label(), activity_log(&selected));
            return self.presenter.render_detail(&view);
        }

        let view = ListView {
            title: format!("Activities · {}", session_id(session)),
            sections: vec![ListSection {
                title: filter.label().to_string(),
                items: indices
                    .iter()
                    .map(|&i| activity_item(i + 1, &activities[i]))
                    .collect(),
            }],
            empty_message: "No activities".to_string(),
            footer: None,
        };
        self.presenter.render_list(&view)
    }

    pub(super) async fn plan(&mut self, session: &str, step: Option<usize>) -> Result<()> {
        let activities = self.all_activities(session).await?;
        let Some(plan) = latest_plan(&activities) else {
            self.presenter.notify(
                &Notice::failure("No plan found", "This session has not generated a plan yet"),
            );
            return Ok(());
        };

        if let Some(number) = step {
            let step = plan
                .steps
                .iter()
                .enumerate()
                .find(|(pos, s)| s.number(*pos) == number)
                .map(|(_, s)| s)
                .with_context(|| {
                    format!("No step {} (plan has {} steps)", number, plan.steps.len())
                })?;
            let view = DetailView::new(format!("Step {}", number), plan_step_markdown(step));
            return self.presenter.render_detail(&view);
        }

        let id = session_id(session);
        let mut view = DetailView::new(
            format!("Plan ({} steps)", plan.steps.len()),
            plan_markdown(plan),
        );
        if let Some(created) = plan.create_time.as_deref() {
            view = view.meta("Created", format_clock(created));
        }
        view = view
            .action("Approve", format!("jules approve {}", id))
            .action("Decline", format!("jules decline {}", id));
        self.presenter.render_detail(&view)
    }

    pub(super) async fn approve(&mut self, session: &str) -> Result<()> {
        self.presenter.notify(&Notice::progress("Approving plan"));
        self.api.approve_plan(session).await?;
        self.presenter.notify(&Notice::success("Plan approved"));
        Ok(())
    }

    pub(super) async fn decline(&mut self, session: &str, reason: Option<String>) -> Result<()> {
        let form = Form::new(
            "Decline Plan",
            vec![FormField::new("reason", "Reason", FieldKind::TextArea)
                .required()
                .value(reason)
                .instructions(decline_instructions())],
        );
        let Some(values) = self.presenter.render_form(&form)? else {
            self.presenter.notify(&Notice::failure("Decline cancelled", "The plan is still pending"));
            return Ok(());
        };
        let reason = values.text("reason").unwrap_or_default();
        self.presenter.notify(&Notice::progress("Declining plan"));
        self.api
            .send_message(session, &format!("I decline the plan. Reason: {}", reason))
            .await?;
        self.presenter.notify(&Notice::success("Plan declined"));
        Ok(())
    }

    pub(super) async fn send(&mut self, session: &str, message: Option<String>) -> Result<()> {
        let form = Form::new(
            "Send Message",
            vec![FormField::new("prompt", "Message", FieldKind::TextArea)
                .required()
                .value(message)
                .instructions(message_instructions(session_id(session)))],
        );
        let Some(values) = self.presenter.render_form(&form)? else {
            self.presenter.notify(&Notice::failure("Message not sent", "Nothing to send"));
            return Ok(());
        };
        let prompt = values.text("prompt").unwrap_or_default();
        self.presenter.notify(&Notice::progress("Sending message"));
        self.api.send_message(session, prompt).await?;
        self.presenter.notify(&Notice::success("Message sent"));
        Ok(())
    }

    pub(super) async fn launch(&mut self, options: LaunchOptions) -> Result<()> {
        let source_name = source_resource_name(&options.source);
        let explicit = options.branch.as_deref().filter(|b| !b.trim().is_empty());
        let branch = match explicit {
            Some(branch) => resolve_starting_branch(Some(branch), None),
            None => {
                let sources = fetch_all_sources(&self.api, DEFAULT_SOURCE_PAGE_SIZE).await?;
                let source = sources.iter().find(|s| s.name == source_name);
                if source.is_none() {
                    tracing::warn!(source = %source_name, "source not found, using main");
                }
                resolve_starting_branch(None, source)
            }
        };

        let repo = format_repo_name(&source_name).to_string();
        let form = Form::new(
            "Launch Session",
            vec![
                FormField::new("prompt", "Prompt", FieldKind::TextArea)
                    .required()
                    .value(options.prompt)
                    .instructions(prompt_instructions(&repo, &branch)),
                FormField::new("title", "Title", FieldKind::Text)
                    .value(options.title)
                    .placeholder("optional"),
                FormField::new("require_plan_approval", "Require plan approval", FieldKind::Checkbox)
                    .value(Some(
                        (options.require_plan_approval
                            || self.config.launch.require_plan_approval)
                            .to_string(),
                    )),
                FormField::new("auto_pr", "Create pull request", FieldKind::Checkbox).value(Some(
                    (options.auto_pr || self.config.launch.auto_create_pr).to_string(),
                )),
            ],
        );
        let Some(values) = self.presenter.render_form(&form)? else {
            self.presenter.notify(&Notice::failure("Launch cancelled", "No prompt given"));
            return Ok(());
        };

        let request = NewSession {
            prompt: values.text("prompt").unwrap_or_default().to_string(),
            source_context: SourceContext {
                source: source_name,
                github_repo_context: Some(GithubRepoContext {
                    starting_branch: branch,
                }),
            },
            title: values.text("title").map(str::to_string),
            require_plan_approval: values.flag("require_plan_approval"),
            automation_mode: if values.flag("auto_pr") {
                AutomationMode::AutoCreatePr
            } else {
                AutomationMode::AutomationModeUnspecified
            },
        };

        self.presenter.notify(&Notice::progress("Creating session"));
        let session = self.api.create_session(&request).await?;
        self.presenter.notify(
            &Notice::success("Session created").with_message(session_label(&session)),
        );
        if !session.url.is_empty() {
            self.presenter.navigate(Navigation::OpenUrl(ensure_protocol(&session.url)));
        }
        Ok(())
    }

    pub(super) async fn sources(&mut self) -> Result<()> {
        let sources = fetch_all_sources(&self.api, DEFAULT_SOURCE_PAGE_SIZE).await?;
        let view = ListView {
            title: "Sources".to_string(),
            sections: vec![ListSection {
                title: String::new(),
                items: sources.iter().map(source_item).collect(),
            }],
            empty_message: "No sources found".to_string(),
            footer: None,
        };
        self.presenter.render_list(&view)
    }

    pub(super) async fn status(&mut self) -> Result<()> {
        let page = self
            .api
            .list_sessions(self.config.list.session_page_size, None)
            .await?;
        let groups = group_sessions(&page.items, &self.now);
        let attention = groups
            .recent()
            .filter(|s| s.state.needs_attention())
            .count();

        let sections = [
            ("Today", &groups.today),
            ("Yesterday", &groups.yesterday),
            ("This Week", &groups.this_week),
        ]
        .into_iter()
        .map(|(title, sessions)| ListSection {
            title: title.to_string(),
            items: sessions
                .iter()
                .map(|s| {
                    let mut item = session_item(s);
                    if let Some(marker) = item.marker {
                        item.accessories[0] = marker.tooltip().to_string();
                    }
                    item
                })
                .collect(),
        })
        .collect();

        let view = ListView {
            title: "Jules".to_string(),
            sections,
            empty_message: "No recent sessions".to_string(),
            footer: (attention > 0).then(|| match attention {
                1 => "1 session needs attention".to_string(),
                n => format!("{} sessions need attention", n),
            }),
        };
        self.presenter.render_list(&view)
    }
}
