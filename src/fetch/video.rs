//! Video acquisition through an external extractor subprocess.
//!
//! The production backend shells out to yt-dlp, asking for the best
//! mp4-compatible streams merged into a single file. The backend is a trait
//! so tests can substitute a fake extractor.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::ContentFetcher;
use crate::config::Config;
use crate::filename;

/// Format selection: prefer pre-merged mp4 streams, else best separate
/// video+audio merged to mp4.
const FORMAT_SELECTION: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio";

/// Release binary fetched by the one-shot self-install.
const YT_DLP_RELEASE_URL: &str =
    "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp";

/// An injected video extraction capability.
#[async_trait]
pub trait VideoExtractionBackend: Send + Sync {
    /// Download the video at `source_url` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction fails or times out.
    async fn download(&self, source_url: &str, dest: &Path) -> Result<()>;
}

/// yt-dlp subprocess backend.
pub struct YtDlpBackend {
    binary_path: String,
    timeout: Duration,
    auto_install: bool,
    http: reqwest::Client,
}

impl YtDlpBackend {
    #[must_use]
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            binary_path: config.yt_dlp_path.clone(),
            timeout: config.video_timeout,
            auto_install: config.yt_dlp_auto_install,
            http,
        }
    }

    /// Where the self-install writes the binary. A bare command name is
    /// anchored to the current directory so the re-spawn finds it.
    fn install_path(&self) -> PathBuf {
        let path = Path::new(&self.binary_path);
        if path.components().count() > 1 {
            path.to_path_buf()
        } else {
            Path::new(".").join(&self.binary_path)
        }
    }

    async fn run(&self, binary: &Path, source_url: &str, dest: &Path) -> Result<()> {
        debug!(binary = %binary.display(), url = %source_url, "Running yt-dlp");

        let mut child = Command::new(binary)
            .arg("-f")
            .arg(FORMAT_SELECTION)
            .arg("--merge-output-format")
            .arg("mp4")
            .arg("-o")
            .arg(dest)
            .arg(source_url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("failed to spawn yt-dlp")?;

        let stderr = child
            .stderr
            .take()
            .context("failed to capture yt-dlp stderr")?;

        // Stream extractor progress through to the log.
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("yt-dlp: {line}");
                if tail.len() >= 20 {
                    tail.remove(0);
                }
                tail.push(line);
            }
            tail
        });

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status.context("failed to wait for yt-dlp")?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out yt-dlp: {e}");
                }
                anyhow::bail!(
                    "yt-dlp timed out after {} seconds",
                    self.timeout.as_secs()
                );
            }
        };

        let stderr_tail = stderr_task.await.unwrap_or_default();

        if !status.success() {
            anyhow::bail!("yt-dlp exited with {status}: {}", stderr_tail.join("\n"));
        }

        Ok(())
    }

    /// One-shot self-install: download the release binary and mark it
    /// executable.
    async fn install(&self) -> Result<PathBuf> {
        let target = self.install_path();
        info!(target = %target.display(), "Installing yt-dlp");

        let response = self
            .http
            .get(YT_DLP_RELEASE_URL)
            .send()
            .await
            .context("failed to download yt-dlp release")?
            .error_for_status()
            .context("yt-dlp release download was rejected")?;

        let bytes = response
            .bytes()
            .await
            .context("failed to read yt-dlp release body")?;

        tokio::fs::write(&target, &bytes)
            .await
            .with_context(|| format!("failed to write {}", target.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755))
                .await
                .with_context(|| format!("failed to mark {} executable", target.display()))?;
        }

        Ok(target)
    }
}

#[async_trait]
impl VideoExtractionBackend for YtDlpBackend {
    async fn download(&self, source_url: &str, dest: &Path) -> Result<()> {
        match self.run(Path::new(&self.binary_path), source_url, dest).await {
            Err(e) if self.auto_install && is_missing_binary(&e) => {
                warn!("yt-dlp binary not found, attempting one-time install");
                let installed = self.install().await.context("yt-dlp self-install failed")?;
                self.run(&installed, source_url, dest).await
            }
            other => other,
        }
    }
}

/// Whether an extraction error means the binary itself is absent.
fn is_missing_binary(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
        .any(|io| io.kind() == std::io::ErrorKind::NotFound)
}

/// Fetches videos through a [`VideoExtractionBackend`].
///
/// The extractor writes to a collision-resistant temp file under the work
/// directory; the file is read into memory and deleted afterwards, and a
/// deletion failure is surfaced rather than swallowed.
pub struct VideoFetcher {
    backend: Arc<dyn VideoExtractionBackend>,
    work_dir: PathBuf,
}

impl VideoFetcher {
    #[must_use]
    pub fn new(backend: Arc<dyn VideoExtractionBackend>, work_dir: PathBuf) -> Self {
        Self { backend, work_dir }
    }

    /// Temp path for one extraction: normalized title plus a random suffix,
    /// so concurrent requests for similarly-named videos cannot collide.
    fn temp_path(&self, title: &str) -> PathBuf {
        let stem = filename::normalize(title);
        let suffix: u32 = rand::random();
        self.work_dir.join(format!("{stem}-{suffix:08x}.mp4"))
    }
}

#[async_trait]
impl ContentFetcher for VideoFetcher {
    fn name(&self) -> &'static str {
        "video"
    }

    async fn fetch(&self, title: &str, source_url: &str) -> Result<Vec<u8>> {
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .with_context(|| {
                format!("failed to create work directory {}", self.work_dir.display())
            })?;

        let dest = self.temp_path(title);

        if let Err(e) = self.backend.download(source_url, &dest).await {
            // Partial files must not accumulate on failure.
            let _ = tokio::fs::remove_file(&dest).await;
            return Err(e);
        }

        let bytes = tokio::fs::read(&dest)
            .await
            .with_context(|| format!("failed to read downloaded video {}", dest.display()))?;

        tokio::fs::remove_file(&dest)
            .await
            .with_context(|| format!("failed to remove temp video file {}", dest.display()))?;

        debug!(url = %source_url, bytes = bytes.len(), "Extracted video");

        Ok(bytes)
    }
}
