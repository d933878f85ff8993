//! YouTube video metadata via the Data API v3.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

static WATCH_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https://)(www\.)?(youtu[^.]*)\.(be|com)/(watch\?v=)?")
        .expect("watch pattern is valid")
});

/// Reshaped video record.
#[derive(Debug, Clone, Serialize)]
pub struct Video {
    pub title: String,
    pub creator: String,
    pub url: String,
}

#[derive(Deserialize)]
struct VideosResponse {
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
struct VideoItem {
    snippet: Snippet,
}

#[derive(Deserialize)]
struct Snippet {
    title: String,
    #[serde(rename = "channelTitle")]
    channel_title: String,
}

pub struct YouTubeClient {
    http: reqwest::Client,
    api_url: String,
    key: String,
}

impl YouTubeClient {
    #[must_use]
    pub fn new(http: reqwest::Client, key: &str) -> Self {
        Self {
            http,
            api_url: "https://youtube.googleapis.com".to_string(),
            key: key.to_string(),
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Look up a video by any of its watch/short URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the video is unknown.
    pub async fn video_info(&self, video_url: &str) -> Result<Video> {
        let id = video_id(video_url);
        let canonical = format!("https://youtu.be/{id}");

        let url = format!(
            "{}/youtube/v3/videos?part=snippet&id={id}&key={}",
            self.api_url, self.key
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("YouTube request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("YouTube request returned {status} for {canonical}");
        }

        let body: VideosResponse = response
            .json()
            .await
            .context("failed to decode YouTube response")?;

        let item = body
            .items
            .into_iter()
            .next()
            .with_context(|| format!("video {id} not found"))?;

        Ok(Video {
            title: item.snippet.title,
            creator: item.snippet.channel_title,
            url: canonical,
        })
    }
}

/// Reduce a watch/short URL to the bare video id.
#[must_use]
pub fn video_id(url: &str) -> String {
    let id = WATCH_PREFIX.replace(url, "");
    id.replace("&feature=share", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_from_watch_url() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(video_id("https://youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(
            video_id("https://youtu.be/dQw4w9WgXcQ&feature=share"),
            "dQw4w9WgXcQ"
        );
    }
}
