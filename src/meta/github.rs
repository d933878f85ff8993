//! GitHub repository metadata via the GraphQL API.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

static REPO_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com/([^/]+)/([^/?#]+)").expect("repo pattern is valid"));

/// Reshaped repository record.
#[derive(Debug, Clone, Serialize)]
pub struct Repo {
    pub name: String,
    pub owner: String,
    pub description: String,
    pub language: String,
    pub url: String,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: GraphQlData,
}

#[derive(Deserialize)]
struct GraphQlData {
    repository: Option<Repository>,
}

#[derive(Deserialize)]
struct Repository {
    name: String,
    owner: Owner,
    description: Option<String>,
    #[serde(rename = "primaryLanguage")]
    primary_language: Option<Language>,
}

#[derive(Deserialize)]
struct Owner {
    login: String,
}

#[derive(Deserialize)]
struct Language {
    name: Option<String>,
}

pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GithubClient {
    #[must_use]
    pub fn new(http: reqwest::Client, token: &str) -> Self {
        Self {
            http,
            api_url: "https://api.github.com/graphql".to_string(),
            token: token.to_string(),
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Look up a repository by its web URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not name a repository or the API
    /// request fails.
    pub async fn repo_info(&self, repo_url: &str) -> Result<Repo> {
        let (owner, name) = parse_repo_url(repo_url)?;

        let query = format!(
            "query {{ repository(owner: \"{owner}\", name: \"{name}\") {{ \
             name owner {{ login }} description primaryLanguage {{ name }} }} }}"
        );

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .context("GitHub GraphQL request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GitHub GraphQL request returned {status}");
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .context("failed to decode GitHub GraphQL response")?;

        let repository = body
            .data
            .repository
            .with_context(|| format!("repository {owner}/{name} not found"))?;

        Ok(Repo {
            name: repository.name,
            owner: repository.owner.login,
            description: repository.description.unwrap_or_default(),
            language: repository
                .primary_language
                .and_then(|l| l.name)
                .unwrap_or_default(),
            url: repo_url.to_string(),
        })
    }
}

/// Extract `(owner, repo)` from a GitHub web URL.
///
/// # Errors
///
/// Returns an error if the URL does not contain an owner/repo pair.
pub fn parse_repo_url(url: &str) -> Result<(String, String)> {
    let caps = REPO_URL
        .captures(url)
        .with_context(|| format!("not a GitHub repository URL: {url}"))?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}
