use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use super::ContentFetcher;

/// Plain HTTP GET fetcher for directly linked media (images, audio).
///
/// The whole body is buffered in memory; the system targets bounded media
/// sizes, not arbitrary downloads.
pub struct DirectFetcher {
    client: reqwest::Client,
}

impl DirectFetcher {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentFetcher for DirectFetcher {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn fetch(&self, _title: &str, source_url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(source_url)
            .send()
            .await
            .with_context(|| format!("request to {source_url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!(
                "request to {source_url} returned {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            );
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read response body from {source_url}"))?;

        debug!(url = %source_url, bytes = bytes.len(), "Downloaded media");

        Ok(bytes.to_vec())
    }
}
