use std::env;
use std::fs;
use std::process::Command;

use anyhow::{Context, Result};
use tempfile::Builder;
use tokio::runtime::{Handle, RuntimeFlavor};

/// Everything from this line down is instructions and is discarded.
const SCISSORS: &str = "# ------------------------ >8 ------------------------";

/// What the temp file starts with.
pub struct ComposeRequest<'a> {
    /// Instruction lines shown below the scissors line.
    pub instructions: Vec<String>,
    pub initial: Option<&'a str>,
}

/// Editor candidates in priority order: config, `$VISUAL`, `$EDITOR`, `vi`.
fn editor_candidates(configured: Option<&str>) -> Vec<String> {
    let from_env = |key: &str| env::var(key).ok().filter(|s| !s.trim().is_empty());
    [
        configured
            .filter(|s| !s.trim().is_empty())
            .map(String::from),
        from_env("VISUAL"),
        from_env("EDITOR"),
        Some("vi".to_string()),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Pick the first candidate found on PATH and split it into program and args.
///
/// When none is installed the first candidate is returned so the launch fails
/// with a readable error. Quoted arguments are honoured via `shell_words`.
fn resolve_editor(configured: Option<&str>) -> Result<(String, Vec<String>)> {
    let mut first: Option<(String, Vec<String>)> = None;
    let mut skipped = Vec::new();

    for raw in editor_candidates(configured) {
        let parts = shell_words::split(&raw)
            .with_context(|| format!("Invalid editor command: {}", raw))?;
        let Some((program, args)) = parts.split_first() else {
            continue;
        };
        let parsed = (program.clone(), args.to_vec());
        if first.is_none() {
            first = Some(parsed.clone());
        }
        if which::which(program).is_ok() {
            if !skipped.is_empty() {
                tracing::warn!(skipped = ?skipped, editor = %program, "using fallback editor");
            }
            return Ok(parsed);
        }
        skipped.push(program.clone());
    }

    Ok(first.unwrap_or_else(|| ("vi".to_string(), Vec::new())))
}

/// Run blocking work from synchronous code that may sit inside an async task.
///
/// On a multi-thread runtime the worker hands its other tasks off first;
/// elsewhere `f` runs directly.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn launch(program: &str, mut command: Command) -> Result<std::process::ExitStatus> {
    run_blocking(|| command.status()).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Editor '{}' not found (also checked $VISUAL and $EDITOR). \
                 Set 'editor' in ~/.config/jules/config.toml to an installed editor.",
                program
            )
        } else {
            anyhow::anyhow!("Failed to launch editor '{}': {}", program, e)
        }
    })
}

fn template(request: &ComposeRequest<'_>) -> String {
    let mut content = String::new();
    if let Some(initial) = request.initial {
        content.push_str(initial);
        if !initial.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push('\n');
    content.push_str(SCISSORS);
    content.push('\n');
    for line in &request.instructions {
        content.push_str("# ");
        content.push_str(line);
        content.push('\n');
    }
    content
}

/// Text above the scissors line, trimmed. `None` when nothing is left.
fn extract_body(content: &str) -> Option<String> {
    let body = match content.find(SCISSORS) {
        Some(idx) => &content[..idx],
        None => content,
    };
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}

/// Open the editor on a temp file and return what the user wrote.
///
/// A non-zero exit or an empty body cancels.
pub fn compose(editor: Option<&str>, request: ComposeRequest<'_>) -> Result<Option<String>> {
    let file = Builder::new()
        .prefix("jules-")
        .suffix(".md")
        .tempfile()
        .context("Failed to create temp file for editor")?;
    fs::write(file.path(), template(&request))?;

    let (program, args) = resolve_editor(editor)?;
    tracing::debug!(editor = %program, path = %file.path().display(), "opening editor");
    let mut command = Command::new(&program);
    command.args(&args).arg(file.path());
    if !launch(&program, command)?.success() {
        return Ok(None);
    }

    let content = fs::read_to_string(file.path())?;
    Ok(extract_body(&content))
}

/// Editor help for a follow-up message to a running session.
pub fn message_instructions(session_title: &str) -> Vec<String> {
    vec![
        format!("Message to session: {}", session_title),
        "Write your message above this line. Save and close to send.".to_string(),
        "Leave it empty to cancel.".to_string(),
    ]
}

/// Editor help for the task description of a new session.
pub fn prompt_instructions(source: &str, branch: &str) -> Vec<String> {
    vec![
        format!("New Jules session on {} ({})", source, branch),
        "Describe the task above this line. Save and close to launch.".to_string(),
        "Leave it empty to cancel.".to_string(),
    ]
}

pub fn decline_instructions() -> Vec<String> {
    vec![
        "Why are you declining this plan?".to_string(),
        "Leave it empty to keep the plan pending.".to_string(),
    ]
}
