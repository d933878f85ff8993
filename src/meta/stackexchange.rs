//! StackExchange question metadata.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

static QUESTION_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(askubuntu|serverfault|stackoverflow|superuser)\.com/questions/(\d+)")
        .expect("question pattern is valid")
});

/// Reshaped question record: title, canonical short links, tags.
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub title: String,
    pub question: String,
    pub answer: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
struct QuestionsResponse {
    items: Vec<QuestionItem>,
}

#[derive(Deserialize)]
struct QuestionItem {
    title: String,
    question_id: u64,
    is_answered: bool,
    #[serde(default)]
    accepted_answer_id: Option<u64>,
    #[serde(default)]
    tags: Vec<String>,
}

pub struct StackExchangeClient {
    http: reqwest::Client,
    api_url: String,
}

impl StackExchangeClient {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: "https://api.stackexchange.com".to_string(),
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Look up a question by its web URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a supported question link or the
    /// API request fails.
    pub async fn question_info(&self, question_url: &str) -> Result<Question> {
        let (site, id) = parse_question_url(question_url)?;

        let url = format!(
            "{}/2.3/questions/{id}?order=desc&sort=activity&site={site}",
            self.api_url
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("StackExchange request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("StackExchange request returned {status}");
        }

        let body: QuestionsResponse = response
            .json()
            .await
            .context("failed to decode StackExchange response")?;

        let item = body
            .items
            .into_iter()
            .next()
            .with_context(|| format!("question {id} not found on {site}"))?;

        let answer = if item.is_answered {
            item.accepted_answer_id
                .map(|answer_id| format!("https://{site}.com/a/{answer_id}"))
        } else {
            None
        };

        Ok(Question {
            title: item.title,
            question: format!("https://{site}.com/q/{}", item.question_id),
            answer,
            tags: item.tags,
        })
    }
}

/// Whether a URL points at a supported StackExchange question.
#[must_use]
pub fn is_question_url(url: &str) -> bool {
    QUESTION_URL.is_match(url)
}

/// Extract `(site, question_id)` from a question URL.
///
/// # Errors
///
/// Returns an error if the URL is not a supported question link.
pub fn parse_question_url(url: &str) -> Result<(String, String)> {
    let caps = QUESTION_URL
        .captures(url)
        .with_context(|| format!("not a StackExchange question URL: {url}"))?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}
