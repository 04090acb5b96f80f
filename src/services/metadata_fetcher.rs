//! Metadata Fetcher.
//!
//! Scrapes Open Graph metadata for one URL. The save and update flows use
//! [`MetadataFetcher::fetch_or_fallback`], which never fails: any error,
//! timeout, or panic inside the scraper degrades to a fallback record so a
//! slow or broken target site cannot block a save. The isolated
//! `fetchMetadata` endpoint uses [`MetadataFetcher::scrape`] and sees errors.
//!
//! One attempt per call; there is no retry.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::types::errors::FetchError;
use crate::types::link::{FetchOutcome, OgImage, OgMetadata};
use crate::types::settings::FetcherSettings;

/// Something that can turn a URL into Open Graph metadata.
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<OgMetadata, FetchError>;
}

/// Scraper that downloads the page with reqwest and parses it with `scraper`.
pub struct HttpScraper {
    client: reqwest::Client,
    timeout: Duration,
    max_body_bytes: usize,
}

impl HttpScraper {
    /// Builds the HTTP client from fetcher settings.
    pub fn new(settings: &FetcherSettings) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            timeout,
            max_body_bytes: settings.max_body_bytes,
        })
    }

    fn map_request_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl PageScraper for HttpScraper {
    async fn scrape(&self, url: &str) -> Result<OgMetadata, FetchError> {
        let target = parse_http_url(url)?;

        let mut response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let final_url = response.url().clone();

        // Bytes past the limit are dropped; the head of a page holds the tags.
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_request_error(e))? {
            let room = self.max_body_bytes.saturating_sub(body.len());
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if body.len() >= self.max_body_bytes {
                break;
            }
        }

        let html = String::from_utf8_lossy(&body);
        debug!(url, bytes = body.len(), "scraped page");
        Ok(parse_open_graph(&html, url, &final_url))
    }
}

/// Accepts only absolute http(s) URLs.
pub fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl(format!("{}: unsupported scheme {}", url, other))),
    }
}

/// Extracts Open Graph metadata from an HTML document.
///
/// `request_url` is recorded verbatim; relative URLs are resolved against
/// `base` (the final URL after redirects). Falls back to `<title>` and
/// `<meta name="description">` when the `og:` tags are missing, and to
/// `/favicon.ico` when no icon link is declared.
pub fn parse_open_graph(html: &str, request_url: &str, base: &Url) -> OgMetadata {
    let document = Html::parse_document(html);
    let mut meta = OgMetadata::new(request_url);
    let mut plain_description: Option<String> = None;

    if let Ok(selector) = Selector::parse("meta") {
        for element in document.select(&selector) {
            let attrs = element.value();
            let key = match attrs.attr("property").or_else(|| attrs.attr("name")) {
                Some(k) => k.trim().to_ascii_lowercase(),
                None => continue,
            };
            let content = match attrs.attr("content").map(str::trim) {
                Some(c) if !c.is_empty() => c,
                _ => continue,
            };

            match key.as_str() {
                "og:title" => set_once(&mut meta.og_title, content),
                "og:description" => set_once(&mut meta.og_description, content),
                "og:site_name" => set_once(&mut meta.og_site_name, content),
                "og:type" => set_once(&mut meta.og_type, content),
                "og:url" => {
                    if meta.og_url.is_none() {
                        meta.og_url = resolve(base, content);
                    }
                }
                "og:image" | "og:image:url" => push_image(&mut meta.og_image, base, content),
                "og:image:secure_url" => {
                    if meta.og_image.is_empty() {
                        push_image(&mut meta.og_image, base, content);
                    }
                }
                "og:image:width" => {
                    if let Some(last) = meta.og_image.last_mut() {
                        last.width = content.parse().ok();
                    }
                }
                "og:image:height" => {
                    if let Some(last) = meta.og_image.last_mut() {
                        last.height = content.parse().ok();
                    }
                }
                "description" => set_once(&mut plain_description, content),
                _ => {}
            }
        }
    }

    if meta.og_title.is_none() {
        meta.og_title = Selector::parse("title").ok().and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
        });
    }
    if meta.og_description.is_none() {
        meta.og_description = plain_description;
    }

    meta.favicon = find_favicon(&document, base).or_else(|| resolve(base, "/favicon.ico"));
    meta
}

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(|u| u.to_string())
}

fn push_image(images: &mut Vec<OgImage>, base: &Url, href: &str) {
    let Some(url) = resolve(base, href) else {
        return;
    };
    if images.last().map(|img| img.url.as_str()) == Some(url.as_str()) {
        return;
    }
    images.push(OgImage::new(url));
}

/// Prefers `rel="icon"`/`"shortcut icon"` over `apple-touch-icon`.
fn find_favicon(document: &Html, base: &Url) -> Option<String> {
    let selector = Selector::parse("link[rel][href]").ok()?;
    let mut touch_icon: Option<&str> = None;

    for element in document.select(&selector) {
        let attrs = element.value();
        let (Some(rel), Some(href)) = (attrs.attr("rel"), attrs.attr("href")) else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() {
            continue;
        }
        let rel = rel.to_ascii_lowercase();
        let mut tokens = rel.split_ascii_whitespace();
        if tokens.clone().any(|t| t == "icon") {
            return resolve(base, href);
        }
        if touch_icon.is_none() && tokens.any(|t| t.starts_with("apple-touch-icon")) {
            touch_icon = Some(href);
        }
    }
    touch_icon.and_then(|href| resolve(base, href))
}

/// Wraps a [`PageScraper`] with an outer timeout and the fallback policy.
#[derive(Clone)]
pub struct MetadataFetcher {
    scraper: Arc<dyn PageScraper>,
    timeout: Duration,
}

impl MetadataFetcher {
    pub fn new(scraper: Arc<dyn PageScraper>, timeout: Duration) -> Self {
        Self { scraper, timeout }
    }

    /// Builds a fetcher around an [`HttpScraper`] configured from settings.
    pub fn from_settings(settings: &FetcherSettings) -> Result<Self, FetchError> {
        let scraper = HttpScraper::new(settings)?;
        Ok(Self::new(Arc::new(scraper), Duration::from_secs(settings.timeout_secs)))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Scrapes `url`, bounded by the fetcher timeout. Errors propagate.
    pub async fn scrape(&self, url: &str) -> Result<OgMetadata, FetchError> {
        match tokio::time::timeout(self.timeout, self.scraper.scrape(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }

    /// Scrapes `url`, returning a fallback record on any failure.
    pub async fn fetch_or_fallback(&self, url: &str) -> FetchOutcome {
        let attempt = AssertUnwindSafe(self.scrape(url)).catch_unwind().await;
        let reason = match attempt {
            Ok(Ok(meta)) => return FetchOutcome::Scraped(meta),
            Ok(Err(err)) => err.to_string(),
            Err(_) => "scraper panicked".to_string(),
        };
        warn!(url, %reason, "metadata fetch failed, saving with blank metadata");
        FetchOutcome::Fallback {
            request_url: url.to_string(),
            reason,
        }
    }
}
