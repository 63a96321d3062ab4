use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubRepo {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub default_branch: Option<Branch>,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

/// A repository Jules can work on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Resource name, `sources/github/<owner>/<repo>`.
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub github_repo: Option<GithubRepo>,
}

impl Source {
    pub fn default_branch(&self) -> Option<&str> {
        self.github_repo
            .as_ref()
            .and_then(|r| r.default_branch.as_ref())
            .map(|b| b.display_name.as_str())
            .filter(|b| !b.is_empty())
    }

    pub fn branch_names(&self) -> Vec<&str> {
        self.github_repo
            .iter()
            .flat_map(|r| r.branches.iter())
            .map(|b| b.display_name.as_str())
            .collect()
    }
}

/// Branch to start from: explicit choice, else the source's default, else `main`.
pub fn resolve_starting_branch(explicit: Option<&str>, source: Option<&Source>) -> String {
    explicit
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .or_else(|| source.and_then(Source::default_branch))
        .unwrap_or("main")
        .to_string()
}

/// Accept `owner/repo`, `github/owner/repo` or the full `sources/...` name.
pub fn source_resource_name(value: &str) -> String {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.starts_with("sources/") {
        trimmed.to_string()
    } else if trimmed.starts_with("github/") {
        format!("sources/{}", trimmed)
    } else {
        format!("sources/github/{}", trimmed)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSourcesResponse {
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}
