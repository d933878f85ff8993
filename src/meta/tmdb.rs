//! Movie and TV metadata via TMDB.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

static MEDIA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"themoviedb\.org/(movie|tv)/(\d+)").expect("media pattern is valid")
});

/// Reshaped movie/show record.
#[derive(Debug, Clone, Serialize)]
pub struct Media {
    pub title: String,
    pub creator: String,
    pub year: String,
    pub kind: String,
}

#[derive(Deserialize)]
struct MovieDetails {
    title: String,
    #[serde(default)]
    release_date: String,
}

#[derive(Deserialize)]
struct ShowDetails {
    name: String,
    #[serde(default)]
    first_air_date: String,
    #[serde(default)]
    created_by: Vec<Creator>,
}

#[derive(Deserialize)]
struct Creator {
    name: String,
}

#[derive(Deserialize)]
struct Credits {
    #[serde(default)]
    crew: Vec<CrewMember>,
}

#[derive(Deserialize)]
struct CrewMember {
    name: String,
    job: String,
}

pub struct TmdbClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl TmdbClient {
    #[must_use]
    pub fn new(http: reqwest::Client, token: &str) -> Self {
        Self {
            http,
            api_url: "https://api.themoviedb.org".to_string(),
            token: token.to_string(),
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{path}", self.api_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("TMDB request to {path} failed"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("TMDB request to {path} returned {status}");
        }

        response
            .json()
            .await
            .with_context(|| format!("failed to decode TMDB response from {path}"))
    }

    async fn directors(&self, category: &str, id: &str) -> Result<String> {
        let credits: Credits = self.get_json(&format!("/3/{category}/{id}/credits")).await?;
        let names: Vec<String> = credits
            .crew
            .into_iter()
            .filter(|member| member.job == "Director")
            .map(|member| member.name)
            .collect();
        Ok(names.join(", "))
    }

    /// Look up a movie or show by its TMDB web URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a TMDB title link or a request
    /// fails.
    pub async fn media_info(&self, media_url: &str) -> Result<Media> {
        let (category, id) = parse_media_url(media_url)?;

        if category == "movie" {
            let details: MovieDetails = self.get_json(&format!("/3/movie/{id}")).await?;
            let creator = self.directors(&category, &id).await?;
            Ok(Media {
                title: details.title,
                creator,
                year: release_year(&details.release_date),
                kind: "movie".to_string(),
            })
        } else {
            let details: ShowDetails = self.get_json(&format!("/3/tv/{id}")).await?;
            // TV credits rarely carry a Director job; fall back to created_by.
            let mut creator = self.directors(&category, &id).await?;
            if creator.is_empty() {
                creator = details
                    .created_by
                    .into_iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ");
            }
            Ok(Media {
                title: details.name,
                creator,
                year: release_year(&details.first_air_date),
                kind: "tv".to_string(),
            })
        }
    }
}

fn release_year(date: &str) -> String {
    date.chars().take(4).collect()
}

/// Extract `(category, id)` from a TMDB title URL.
///
/// # Errors
///
/// Returns an error if the URL is not a movie or TV title link.
pub fn parse_media_url(url: &str) -> Result<(String, String)> {
    let caps = MEDIA_URL
        .captures(url)
        .with_context(|| format!("not a TMDB title URL: {url}"))?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}
