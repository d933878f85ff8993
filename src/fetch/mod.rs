//! Content fetch strategies.
//!
//! Exactly one fetcher runs per archive request, selected by the declared
//! media type: articles render through a headless browser, videos go
//! through the external extractor, everything else is a direct download.

use anyhow::Result;
use async_trait::async_trait;

pub mod article;
pub mod direct;
pub mod video;

pub use article::ArticleFetcher;
pub use direct::DirectFetcher;
pub use video::{VideoExtractionBackend, VideoFetcher, YtDlpBackend};

/// A strategy for turning a source URL into an in-memory payload.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Stage identifier used in error context.
    fn name(&self) -> &'static str;

    /// Fetch the content behind `source_url`.
    ///
    /// # Errors
    ///
    /// Returns an error on any network, render, extraction, or subprocess
    /// failure; failures are fatal for the request and are not retried here.
    async fn fetch(&self, title: &str, source_url: &str) -> Result<Vec<u8>>;
}
