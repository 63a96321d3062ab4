use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::activity::{Activity, ListActivitiesResponse};
use super::session::{session_resource_name, ListSessionsResponse, NewSession, Session};
use super::source::{ListSourcesResponse, Source};

pub const DEFAULT_BASE_URL: &str = "https://jules.googleapis.com/v1alpha";
pub const DEFAULT_SESSION_PAGE_SIZE: u32 = 20;
pub const DEFAULT_ACTIVITY_PAGE_SIZE: u32 = 50;
pub const DEFAULT_SOURCE_PAGE_SIZE: u32 = 50;

/// Stop following `nextPageToken` after this many pages.
pub const MAX_PAGES: usize = 100;

const API_KEY_HEADER: &str = "X-Goog-Api-Key";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Jules API key is not configured. Set JULES_API_KEY or run `jules init`")]
    MissingApiKey,
    #[error("Failed to {action}: {status} - {body}")]
    Http {
        action: String,
        status: u16,
        body: String,
    },
    #[error("Network error while trying to {action}: {source}")]
    Network {
        action: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to decode response for {action}: {message}")]
    Decode { action: String, message: String },
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            // The service sends "" on the last page
            next_page_token: next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait]
pub trait JulesApi: Send + Sync {
    async fn list_sessions(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Session>, ApiError>;

    async fn get_session(&self, session: &str) -> Result<Session, ApiError>;

    async fn create_session(&self, request: &NewSession) -> Result<Session, ApiError>;

    async fn list_activities(
        &self,
        session: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Activity>, ApiError>;

    async fn send_message(&self, session: &str, prompt: &str) -> Result<(), ApiError>;

    async fn approve_plan(&self, session: &str) -> Result<(), ApiError>;

    async fn list_sources(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Source>, ApiError>;
}

/// Walk every activity page of a session, oldest first.
pub async fn fetch_all_activities<A: JulesApi + ?Sized>(
    api: &A,
    session: &str,
    page_size: u32,
) -> Result<Vec<Activity>, ApiError> {
    let mut all = Vec::new();
    let mut token: Option<String> = None;
    for page_index in 0..MAX_PAGES {
        let page = api
            .list_activities(session, page_size, token.as_deref())
            .await?;
        all.extend(page.items);
        match page.next_page_token {
            Some(next) => token = Some(next),
            None => return Ok(all),
        }
        tracing::debug!(session, page = page_index + 1, "fetching next activity page");
    }
    tracing::warn!(session, pages = MAX_PAGES, "activity page cap reached");
    Ok(all)
}

pub async fn fetch_all_sources<A: JulesApi + ?Sized>(
    api: &A,
    page_size: u32,
) -> Result<Vec<Source>, ApiError> {
    let mut all = Vec::new();
    let mut token: Option<String> = None;
    for _ in 0..MAX_PAGES {
        let page = api.list_sources(page_size, token.as_deref()).await?;
        all.extend(page.items);
        match page.next_page_token {
            Some(next) => token = Some(next),
            None => return Ok(all),
        }
    }
    tracing::warn!(pages = MAX_PAGES, "source page cap reached");
    Ok(all)
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP implementation of [`JulesApi`].
pub struct JulesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl JulesClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("jules-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Network {
                action: "build HTTP client".to_string(),
                source,
            })?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn key(&self) -> Result<&str, ApiError> {
        self.api_key.as_deref().ok_or(ApiError::MissingApiKey)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        action: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, action, "GET");
        let request = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, self.key()?)
            .query(query);
        let body = send(action, request).await?;
        decode(action, &body)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        action: &str,
        path: &str,
        body: &B,
    ) -> Result<String, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, action, "POST");
        let request = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.key()?)
            .json(body);
        send(action, request).await
    }
}

async fn send(action: &str, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
    let network = |source: reqwest::Error| ApiError::Network {
        action: action.to_string(),
        source,
    };
    let response = request.send().await.map_err(network)?;
    let status = response.status();
    let body = response.text().await.map_err(network)?;
    if !status.is_success() {
        tracing::debug!(action, status = status.as_u16(), "request failed");
        return Err(ApiError::Http {
            action: action.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn decode<T: DeserializeOwned>(action: &str, body: &str) -> Result<T, ApiError> {
    // Empty list responses come back as "{}" or nothing at all
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::Decode {
        action: action.to_string(),
        message: e.to_string(),
    })
}

fn page_query(page_size: u32, page_token: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![("pageSize", page_size.to_string())];
    if let Some(token) = page_token.filter(|t| !t.is_empty()) {
        query.push(("pageToken", token.to_string()));
    }
    query
}

#[async_trait]
impl JulesApi for JulesClient {
    async fn list_sessions(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Session>, ApiError> {
        let response: ListSessionsResponse = self
            .get(
                "fetch sessions",
                "sessions",
                &page_query(page_size, page_token),
            )
            .await?;
        Ok(Page::new(response.sessions, response.next_page_token))
    }

    async fn get_session(&self, session: &str) -> Result<Session, ApiError> {
        let name = session_resource_name(session);
        self.get("fetch session", &name, &[]).await
    }

    async fn create_session(&self, request: &NewSession) -> Result<Session, ApiError> {
        let body = self.post("create session", "sessions", request).await?;
        decode("create session", &body)
    }

    async fn list_activities(
        &self,
        session: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Activity>, ApiError> {
        let path = format!("{}/activities", session_resource_name(session));
        let response: ListActivitiesResponse = self
            .get(
                "fetch activities",
                &path,
                &page_query(page_size, page_token),
            )
            .await?;
        Ok(Page::new(response.activities, response.next_page_token))
    }

    async fn send_message(&self, session: &str, prompt: &str) -> Result<(), ApiError> {
        let path = format!("{}:sendMessage", session_resource_name(session));
        self.post(
            "send message",
            &path,
            &serde_json::json!({ "prompt": prompt }),
        )
        .await?;
        Ok(())
    }

    async fn approve_plan(&self, session: &str) -> Result<(), ApiError> {
        let path = format!("{}:approvePlan", session_resource_name(session));
        self.post("approve plan", &path, &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn list_sources(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Source>, ApiError> {
        let response: ListSourcesResponse = self
            .get(
                "fetch sources",
                "sources",
                &page_query(page_size, page_token),
            )
            .await?;
        Ok(Page::new(response.sources, response.next_page_token))
    }
}
