//! The archival pipeline: fetch, resolve type, upload, return a public URL.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::fetch::{
    ArticleFetcher, ContentFetcher, DirectFetcher, VideoExtractionBackend, VideoFetcher,
    YtDlpBackend,
};
use crate::filename;
use crate::media_type::MediaType;
use crate::storage::B2Client;

/// Storage key prefix for all archived bookmark content.
const ARCHIVE_PREFIX: &str = "Bookmarks";

/// Composes the fetchers, type resolver, and uploader into a single
/// `archive` operation. Stateless between invocations: every call
/// re-fetches and re-authenticates.
pub struct Archiver {
    storage: B2Client,
    article: ArticleFetcher,
    direct: DirectFetcher,
    video: VideoFetcher,
}

impl Archiver {
    /// Build an archiver with the production yt-dlp backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("failed to build HTTP client")?;
        let backend = Arc::new(YtDlpBackend::new(config, http.clone()));
        Self::with_video_backend(config, http, backend)
    }

    /// Build an archiver with an injected video extraction backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage client cannot be built.
    pub fn with_video_backend(
        config: &Config,
        http: reqwest::Client,
        backend: Arc<dyn VideoExtractionBackend>,
    ) -> Result<Self> {
        let storage = B2Client::new(config).context("failed to build storage client")?;
        Ok(Self {
            storage,
            article: ArticleFetcher::new(config),
            direct: DirectFetcher::new(http),
            video: VideoFetcher::new(backend, config.work_dir.clone()),
        })
    }

    fn fetcher_for(&self, media_type: MediaType) -> &dyn ContentFetcher {
        match media_type {
            MediaType::Articles => &self.article,
            MediaType::Videos => &self.video,
            MediaType::Comics | MediaType::Podcasts => &self.direct,
        }
    }

    /// Archive the content behind a bookmark and return its public URL.
    ///
    /// Fails as a whole on any stage failure; nothing is retried here, and
    /// a fetched-but-not-uploaded payload is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error naming the failed stage, with the cause chained.
    pub async fn archive(&self, name: &str, source_url: &str, declared_type: &str) -> Result<String> {
        let media_type = MediaType::parse(declared_type)
            .with_context(|| format!("unrecognized media type: {declared_type:?}"))?;

        let fetcher = self.fetcher_for(media_type);
        let content = fetcher
            .fetch(name, source_url)
            .await
            .with_context(|| format!("{} fetch failed for {source_url}", fetcher.name()))?;

        let file_type = media_type.file_type(source_url);
        if file_type.extension.is_empty() {
            anyhow::bail!(
                "could not resolve a file extension for {media_type} content at {source_url}"
            );
        }

        let remote_name = format!(
            "{ARCHIVE_PREFIX}/{}/{}.{}",
            media_type.folder(),
            filename::normalize(name),
            file_type.extension
        );

        let archived = self
            .storage
            .upload(&content, &remote_name, &file_type.mime)
            .await
            .with_context(|| format!("upload failed for {remote_name}"))?;

        info!(
            name = %name,
            file = %archived.file_name,
            url = %archived.public_url,
            "Archived bookmark content"
        );

        Ok(archived.public_url)
    }
}
