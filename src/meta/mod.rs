//! Provider metadata lookups.
//!
//! Thin fetch-and-reshape clients for the external APIs used to enrich
//! non-bookmark records. Each client takes its base URL at construction so
//! tests can point it at a local mock server.

use anyhow::{Context, Result};

use crate::config::Config;

pub mod github;
pub mod mangadex;
pub mod scryfall;
pub mod stackexchange;
pub mod tmdb;
pub mod youtube;

/// User agent sent on all provider requests (GitHub rejects anonymous ones).
pub const META_USER_AGENT: &str = concat!("bookmark-archiver/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for provider lookups.
///
/// # Errors
///
/// Returns an error if the client cannot be built.
pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(META_USER_AGENT)
        .timeout(config.http_timeout)
        .build()
        .context("failed to build metadata HTTP client")
}

/// Dispatch a lookup by URL shape and return the reshaped record as JSON.
///
/// # Errors
///
/// Returns an error for unsupported URLs, missing provider credentials, or
/// any provider request failure.
pub async fn lookup(config: &Config, url: &str) -> Result<serde_json::Value> {
    let http = http_client(config)?;

    if url.contains("github.com") {
        let token = config
            .github_token
            .as_deref()
            .context("GITHUB_TOKEN is not configured")?;
        let repo = github::GithubClient::new(http, token)
            .repo_info(url)
            .await?;
        return serde_json::to_value(repo).context("failed to encode repo record");
    }

    if url.contains("scryfall.com") {
        let card = scryfall::ScryfallClient::new(http).card_from_page(url).await?;
        return serde_json::to_value(card).context("failed to encode card record");
    }

    if stackexchange::is_question_url(url) {
        let question = stackexchange::StackExchangeClient::new(http)
            .question_info(url)
            .await?;
        return serde_json::to_value(question).context("failed to encode question record");
    }

    if url.contains("themoviedb.org") {
        let key = config
            .tmdb_key
            .as_deref()
            .context("TMDB_KEY is not configured")?;
        let media = tmdb::TmdbClient::new(http, key).media_info(url).await?;
        return serde_json::to_value(media).context("failed to encode media record");
    }

    if url.contains("youtu") {
        let key = config
            .youtube_key
            .as_deref()
            .context("YOUTUBE_KEY is not configured")?;
        let video = youtube::YouTubeClient::new(http, key).video_info(url).await?;
        return serde_json::to_value(video).context("failed to encode video record");
    }

    if url.contains("mangadex.org") {
        let manga = mangadex::MangaDexClient::new(http).manga_info(url).await?;
        return serde_json::to_value(manga).context("failed to encode manga record");
    }

    anyhow::bail!("no metadata provider matches {url}")
}
