use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;

/// Default config.toml content
const DEFAULT_CONFIG: &str = r#"# Jules API key (https://jules.google.com/settings#api).
# JULES_API_KEY in the environment takes precedence.
# api_key = "..."

# base_url = "https://jules.googleapis.com/v1alpha"
timeout_secs = 30

# Editor for messages, prompts and decline reasons.
# Resolved in order: this value → $VISUAL → $EDITOR → vi
# Supports arguments: editor = "code --wait"
# editor = "vim"

# Directory for saved media artifacts (default: your Downloads folder)
# download_dir = "/home/me/Downloads"

[diff]
# Inline diffs longer than this are cut on a line boundary (0 = no limit)
max_display_lines = 400
max_display_bytes = 49152

[launch]
require_plan_approval = false
auto_create_pr = false

[list]
session_page_size = 20
activity_page_size = 50
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Written,
    Skipped,
}

/// Run the init command
pub fn run_init(force: bool) -> Result<()> {
    let config_path = Config::config_path()?;
    match write_default_config(&config_path, force)? {
        InitOutcome::Written => {
            println!("Wrote {}", config_path.display());
            println!();
            println!("Initialization complete!");
            println!("Add your API key to the file or export JULES_API_KEY.");
        }
        InitOutcome::Skipped => {
            println!(
                "Skipping {} (already exists, use --force to overwrite)",
                config_path.display()
            );
        }
    }
    Ok(())
}

/// Write the default config unless one exists and `force` is off.
pub fn write_default_config(path: &Path, force: bool) -> Result<InitOutcome> {
    if path.exists() && !force {
        return Ok(InitOutcome::Skipped);
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            println!("Creating configuration directory: {}", dir.display());
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(InitOutcome::Written)
}
