//! Manga metadata via the MangaDex API.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

static TITLE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^/]+/title/([a-f0-9-]+)").expect("title pattern is valid")
});

/// Asset host for cover images.
const ASSETS_URL: &str = "https://uploads.mangadex.org";

/// Reshaped manga record.
#[derive(Debug, Clone, Serialize)]
pub struct Manga {
    pub title: String,
    pub description: String,
    pub author: String,
    pub year: Option<u32>,
    pub status: String,
    pub cover: String,
    pub url: String,
}

#[derive(Deserialize)]
struct MangaResponse {
    data: MangaData,
}

#[derive(Deserialize)]
struct MangaData {
    attributes: MangaAttributes,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

#[derive(Deserialize)]
struct MangaAttributes {
    title: Localized,
    #[serde(default)]
    description: Localized,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    status: String,
}

#[derive(Default, Deserialize)]
struct Localized {
    #[serde(default)]
    en: String,
}

#[derive(Deserialize)]
struct Relationship {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: Option<RelationshipAttributes>,
}

#[derive(Deserialize)]
struct RelationshipAttributes {
    #[serde(rename = "fileName", default)]
    file_name: String,
}

#[derive(Deserialize)]
struct AuthorResponse {
    data: AuthorData,
}

#[derive(Deserialize)]
struct AuthorData {
    attributes: AuthorAttributes,
}

#[derive(Deserialize)]
struct AuthorAttributes {
    name: String,
}

pub struct MangaDexClient {
    http: reqwest::Client,
    api_url: String,
    assets_url: String,
}

impl MangaDexClient {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: "https://api.mangadex.org".to_string(),
            assets_url: ASSETS_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn author_name(&self, author_id: &str) -> Result<String> {
        let response = self
            .http
            .get(format!("{}/author/{author_id}", self.api_url))
            .send()
            .await
            .context("MangaDex author request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("MangaDex author request returned {status}");
        }

        let body: AuthorResponse = response
            .json()
            .await
            .context("failed to decode MangaDex author response")?;

        Ok(body.data.attributes.name)
    }

    /// Look up a manga by its title page URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a title link or a request fails.
    pub async fn manga_info(&self, manga_url: &str) -> Result<Manga> {
        let id = parse_title_url(manga_url)?;

        let url = format!(
            "{}/manga/{id}?includes%5B%5D=cover_art&includes%5B%5D=author",
            self.api_url
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("MangaDex manga request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("MangaDex manga request returned {status}");
        }

        let body: MangaResponse = response
            .json()
            .await
            .context("failed to decode MangaDex manga response")?;

        let cover_file = body
            .data
            .relationships
            .iter()
            .find(|rel| rel.kind == "cover_art")
            .and_then(|rel| rel.attributes.as_ref())
            .map(|attrs| attrs.file_name.clone())
            .unwrap_or_default();

        let author = match body
            .data
            .relationships
            .iter()
            .find(|rel| rel.kind == "author")
        {
            Some(rel) => self.author_name(&rel.id).await?,
            None => String::new(),
        };

        Ok(Manga {
            title: body.data.attributes.title.en,
            description: body.data.attributes.description.en,
            author,
            year: body.data.attributes.year,
            status: body.data.attributes.status,
            cover: format!("{}/covers/{id}/{cover_file}", self.assets_url),
            url: manga_url.to_string(),
        })
    }
}

/// Extract the title UUID from a MangaDex URL.
///
/// # Errors
///
/// Returns an error if the URL is not a title link.
pub fn parse_title_url(url: &str) -> Result<String> {
    let caps = TITLE_URL
        .captures(url)
        .with_context(|| format!("not a MangaDex title URL: {url}"))?;
    Ok(caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_title_url() {
        let id = parse_title_url(
            "https://mangadex.org/title/a96676e5-8ae2-425e-b549-7f15dd34a6d8/komi-san",
        )
        .unwrap();
        assert_eq!(id, "a96676e5-8ae2-425e-b549-7f15dd34a6d8");
    }

    #[test]
    fn test_parse_title_url_rejects_other_pages() {
        assert!(parse_title_url("https://mangadex.org/chapter/abc").is_err());
    }
}
