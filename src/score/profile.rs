use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GitHubConfig;

/// Public profile attributes the score engine reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubProfile {
    pub login: String,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    pub created_year: i32,
    pub has_bio: bool,
    pub has_blog: bool,
}

/// Outcome of a profile lookup. Transport failures are reported as `NotFound`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileLookup {
    Found(GitHubProfile),
    NotFound,
}

impl ProfileLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, ProfileLookup::Found(_))
    }
}

/// Profile source. Implementations must not fail: anything that is not a
/// positive answer is `NotFound`.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch(&self, login: &str) -> ProfileLookup;
}

/// Fetcher used when GitHub lookups are turned off. Everything scores in demo mode.
pub struct DemoOnlyFetcher;

#[async_trait]
impl ProfileFetcher for DemoOnlyFetcher {
    async fn fetch(&self, _login: &str) -> ProfileLookup {
        ProfileLookup::NotFound
    }
}

/// `GET /users/{login}` payload, only the fields we use
#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    #[serde(default)]
    public_repos: u64,
    #[serde(default)]
    followers: u64,
    #[serde(default)]
    following: u64,
    created_at: DateTime<Utc>,
    bio: Option<String>,
    blog: Option<String>,
}

fn non_blank(field: &Option<String>) -> bool {
    field.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

impl From<GitHubUser> for GitHubProfile {
    fn from(user: GitHubUser) -> Self {
        GitHubProfile {
            has_bio: non_blank(&user.bio),
            has_blog: non_blank(&user.blog),
            login: user.login,
            public_repos: user.public_repos,
            followers: user.followers,
            following: user.following,
            created_year: user.created_at.year(),
        }
    }
}

/// GitHub logins: ASCII alphanumerics and single inner hyphens, at most 39 chars.
/// Anything else (agent DIDs, URLs) can never resolve, so no request is made.
pub fn is_github_login(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 39
        && !s.starts_with('-')
        && !s.ends_with('-')
        && !s.contains("--")
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

pub struct GitHubFetcher {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubFetcher {
    pub fn new(config: &GitHubConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build GitHub HTTP client: {}", e))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    async fn try_fetch(&self, login: &str) -> anyhow::Result<Option<GitHubUser>> {
        let url = format!("{}/users/{}", self.api_base, login);
        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let user = response.error_for_status()?.json::<GitHubUser>().await?;
        Ok(Some(user))
    }
}

#[async_trait]
impl ProfileFetcher for GitHubFetcher {
    async fn fetch(&self, login: &str) -> ProfileLookup {
        if !is_github_login(login) {
            debug!("'{}' is not a GitHub login, skipping lookup", login);
            return ProfileLookup::NotFound;
        }

        match self.try_fetch(login).await {
            Ok(Some(user)) => ProfileLookup::Found(user.into()),
            Ok(None) => {
                debug!("GitHub user {} not found", login);
                ProfileLookup::NotFound
            }
            Err(e) => {
                warn!("GitHub lookup for {} failed, falling back to demo mode: {}", login, e);
                ProfileLookup::NotFound
            }
        }
    }
}
