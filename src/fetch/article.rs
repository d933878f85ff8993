//! Article extraction via headless Chromium.
//!
//! The page is rendered at a fixed desktop viewport so responsive layouts
//! serve their full-content variant, a denylist of known annoyance
//! selectors (and all embedded media) is stripped in-page, and the cleaned
//! DOM is distilled to the main article body and converted to Markdown.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::ContentFetcher;
use crate::config::Config;

/// Desktop viewport emulated for rendering.
pub const VIEWPORT_WIDTH: u32 = 1200;
pub const VIEWPORT_HEIGHT: u32 = 630;

/// Minimum text length for a container to count as the article body.
const MIN_ARTICLE_CHARS: usize = 250;

/// Selectors removed from the rendered page before extraction: newsletter
/// prompts, related-content modules, sidebars, and all embedded media.
const STRIP_SELECTORS: &[&str] = &[
    // WIRED
    "div.newsletter-subscribe-form",
    "div[class^='RecircMostPopularContiner']",
    "div[data-attr-viewport-monitor]",
    "div[class^='NewsletterSubscribeFormWrapper']",
    "div[data-testid='NewsletterSubscribeFormWrapper']",
    "div[class^='GenericCalloutWrapper']",
    "div[data-testid='GenericCallout']",
    "aside[class^='Sidebar']",
    "aside[data-testid='SidebarEmbed']",
    "div[class^='ContributorsWrapper']",
    "div[data-testid='Contributors']",
    // The Atlantic
    "p[class^='ArticleRelatedContentLink']",
    "div[class^='ArticleRelatedContentModule']",
    "div[class^='ArticleBooksModule']",
    // Ars Technica
    "div.gallery",
    "div.story-sidebar",
    // Media
    "img",
    "picture",
    "figure",
    "video",
    "iframe",
];

/// Containers tried, in order, when isolating the article body.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role='main']",
    "#content",
    ".post-content",
    ".article-body",
    "body",
];

static SINGLE_QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{2018}\u{2019}]+").expect("quote pattern is valid"));
static DOUBLE_QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{201c}\u{201d}]+").expect("quote pattern is valid"));
static EM_DASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{2014}+").expect("dash pattern is valid"));

/// Renders a page and extracts its readable body as Markdown.
pub struct ArticleFetcher {
    chrome_path: Option<String>,
    page_load_timeout: Duration,
}

impl ArticleFetcher {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            chrome_path: config.chrome_path.clone(),
            page_load_timeout: config.page_load_timeout,
        }
    }

    /// Render `source_url` in a fresh headless browser and return the
    /// cleaned DOM serialized to HTML.
    async fn render(&self, source_url: &str) -> Result<String> {
        let mut builder = BrowserConfig::builder()
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .request_timeout(self.page_load_timeout)
            .no_sandbox()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--mute-audio")
            .arg("--hide-scrollbars");

        if let Some(ref chrome_path) = self.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }

        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("failed to launch browser")?;

        // Drive CDP events in the background for the life of the browser.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        let result = self.render_page(&browser, source_url).await;

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser: {e}");
        }
        handler_task.abort();

        result
    }

    async fn render_page(&self, browser: &Browser, source_url: &str) -> Result<String> {
        let page = tokio::time::timeout(self.page_load_timeout, browser.new_page(source_url))
            .await
            .context("page load timed out")?
            .context("failed to open page")?;

        page.wait_for_navigation()
            .await
            .context("page navigation failed")?;

        // Let late-loading content settle before stripping.
        tokio::time::sleep(Duration::from_millis(500)).await;

        let selectors =
            serde_json::to_string(STRIP_SELECTORS).context("failed to encode selector list")?;
        let strip_js = format!(
            "(() => {{ for (const sel of {selectors}) {{ \
             document.querySelectorAll(sel).forEach((el) => el.remove()); }} }})()"
        );
        page.evaluate(strip_js)
            .await
            .context("failed to strip boilerplate elements")?;

        let html = page
            .content()
            .await
            .context("failed to serialize rendered page")?;

        if let Err(e) = page.close().await {
            warn!("Failed to close page: {e}");
        }

        Ok(html)
    }
}

#[async_trait]
impl ContentFetcher for ArticleFetcher {
    fn name(&self) -> &'static str {
        "article"
    }

    async fn fetch(&self, title: &str, source_url: &str) -> Result<Vec<u8>> {
        let html = self.render(source_url).await?;
        let body_html = extract_article_html(&html)?;
        let markdown = to_markdown(title, source_url, &body_html)?;
        Ok(markdown.into_bytes())
    }
}

/// Readability pass: pick the first content container with enough text.
fn extract_article_html(html: &str) -> Result<String> {
    let document = Html::parse_document(html);

    for candidate in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text_len: usize = element.text().map(str::len).sum();
            if text_len >= MIN_ARTICLE_CHARS {
                debug!(selector = %candidate, text_len, "Selected article container");
                return Ok(element.inner_html());
            }
        }
    }

    anyhow::bail!("no readable content found")
}

/// Convert the extracted body to Markdown and apply typographic cleanup.
fn to_markdown(title: &str, source_url: &str, body_html: &str) -> Result<String> {
    let markdown =
        htmd::convert(body_html).map_err(|e| anyhow::anyhow!("markdown conversion failed: {e}"))?;

    let markdown = SINGLE_QUOTES.replace_all(&markdown, "'");
    let mut markdown = DOUBLE_QUOTES.replace_all(&markdown, "\"").into_owned();

    // WIRED uses em-dashes as decorative separators; drop them.
    let host = url::Url::parse(source_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    if host.contains("wired") {
        markdown = EM_DASHES.replace_all(&markdown, "").into_owned();
    }

    Ok(format!("# {title}\n\n{}", markdown.trim_start()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILLER: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do \
        eiusmod tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim \
        veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo \
        consequat. Duis aute irure dolor in reprehenderit in voluptate velit esse.";

    #[test]
    fn test_extract_prefers_article_element() {
        let html = format!(
            "<html><body><nav>menu menu menu</nav>\
             <article><p>{FILLER}</p></article>\
             <footer>legal</footer></body></html>"
        );
        let body = extract_article_html(&html).unwrap();
        assert!(body.contains("Lorem ipsum"));
        assert!(!body.contains("menu menu"));
    }

    #[test]
    fn test_extract_falls_back_to_body() {
        let html = format!("<html><body><p>{FILLER}</p></body></html>");
        let body = extract_article_html(&html).unwrap();
        assert!(body.contains("Lorem ipsum"));
    }

    #[test]
    fn test_extract_fails_on_empty_page() {
        let err = extract_article_html("<html><body><p>thin</p></body></html>").unwrap_err();
        assert!(err.to_string().contains("no readable content"));
    }

    #[test]
    fn test_markdown_heading_and_quotes() {
        let md = to_markdown(
            "A Title",
            "https://example.com/post",
            "<p>\u{201c}Hello\u{201d} \u{2018}there\u{2019}</p>",
        )
        .unwrap();
        assert!(md.starts_with("# A Title\n\n"));
        assert!(md.contains("\"Hello\" 'there'"));
    }

    #[test]
    fn test_markdown_strips_em_dashes_for_wired() {
        let md = to_markdown(
            "T",
            "https://www.wired.com/story/x",
            "<p>before \u{2014} after</p>",
        )
        .unwrap();
        assert!(!md.contains('\u{2014}'));

        let md = to_markdown(
            "T",
            "https://example.com/story/x",
            "<p>before \u{2014} after</p>",
        )
        .unwrap();
        assert!(md.contains('\u{2014}'));
    }
}
