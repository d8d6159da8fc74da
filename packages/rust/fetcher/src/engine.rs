//! Transcript download engine.
//!
//! Walks the site's transcript list pages, matches entry titles against the
//! show registry, and downloads each new transcript to
//! `{PREFIX}_{N}.html`. Transcripts already on disk are never re-fetched;
//! list pages deep in the archive are served from an on-disk cache.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use url::Url;

use castpack_shared::{CastpackError, FetchOptions, Result, shows};

use crate::listing::{ListItem, episode_number, extract_items};

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("castpack/", env!("CARGO_PKG_VERSION"));

/// Default transcript list URL.
const LIST_URL: &str = "https://twit.tv/posts/transcripts";
/// Default site root, joined with the relative hrefs from list pages.
const SITE_URL: &str = "https://twit.tv";

// ---------------------------------------------------------------------------
// FetchSummary
// ---------------------------------------------------------------------------

/// Accounting for one completed fetch run.
#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    /// List pages scanned before stopping.
    pub pages_scanned: u32,
    /// Transcripts newly downloaded.
    pub downloaded: usize,
    /// Transcripts skipped because they were already on disk.
    pub skipped: usize,
    /// Errors encountered (URL, error message); the run continues past them.
    pub errors: Vec<(String, String)>,
}

/// Progress callback for reporting fetch status.
pub trait FetchProgress: Send + Sync {
    /// Called after each list page is scanned.
    fn page_scanned(&self, page: u32, items: usize);
    /// Called after each transcript is downloaded.
    fn transcript_downloaded(&self, prefix: &str, number: &str, title: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentFetchProgress;

impl FetchProgress for SilentFetchProgress {
    fn page_scanned(&self, _page: u32, _items: usize) {}
    fn transcript_downloaded(&self, _prefix: &str, _number: &str, _title: &str) {}
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Polite transcript downloader with retries and list-page caching.
pub struct Fetcher {
    options: FetchOptions,
    client: Client,
    list_url: Url,
    site_url: Url,
}

impl Fetcher {
    /// Create a fetcher pointed at the production site.
    pub fn new(options: FetchOptions) -> Result<Self> {
        let list_url = Url::parse(LIST_URL).expect("valid URL");
        let site_url = Url::parse(SITE_URL).expect("valid URL");
        Self::with_base_urls(options, list_url, site_url)
    }

    /// Create a fetcher with explicit base URLs (for integration tests).
    pub fn with_base_urls(options: FetchOptions, list_url: Url, site_url: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CastpackError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            options,
            client,
            list_url,
            site_url,
        })
    }

    /// Walk the list pages and download every new transcript belonging to
    /// one of the target prefixes into `data_dir`.
    ///
    /// Stops early when a list page yields no entries (the end of the
    /// archive) or fails to download after retries.
    #[instrument(skip_all, fields(targets = targets.len(), pages = self.options.pages))]
    pub async fn run(
        &self,
        targets: &[String],
        data_dir: &Path,
        progress: &dyn FetchProgress,
    ) -> Result<FetchSummary> {
        fs::create_dir_all(data_dir)
            .await
            .map_err(|e| CastpackError::io(data_dir, e))?;

        let mut summary = FetchSummary::default();

        for page in 1..=self.options.pages {
            let content = match self.list_page(page, data_dir).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(page, error = %e, "list page unavailable, stopping scan");
                    summary.errors.push((format!("list page {page}"), e.to_string()));
                    break;
                }
            };

            let items = extract_items(&content);
            summary.pages_scanned = page;
            progress.page_scanned(page, items.len());

            if items.is_empty() {
                info!(page, "no entries on list page, stopping scan");
                break;
            }
            debug!(page, items = items.len(), "list page scanned");

            for item in &items {
                self.handle_item(item, targets, data_dir, progress, &mut summary)
                    .await;
            }
        }

        info!(
            pages = summary.pages_scanned,
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "fetch complete"
        );

        Ok(summary)
    }

    /// Download one list entry if it belongs to a target show and is not
    /// already on disk.
    async fn handle_item(
        &self,
        item: &ListItem,
        targets: &[String],
        data_dir: &Path,
        progress: &dyn FetchProgress,
        summary: &mut FetchSummary,
    ) {
        let Some(prefix) = shows::prefix_for_title(&item.title) else {
            return; // not a show we know
        };
        if !targets.iter().any(|t| t.as_str() == prefix) {
            debug!(title = %item.title, prefix, "not in target list, ignoring");
            return;
        }

        let number = episode_number(&item.title).unwrap_or("unknown");
        let dest = data_dir.join(format!("{prefix}_{number}.html"));
        if dest.exists() {
            debug!(path = %dest.display(), "already downloaded");
            summary.skipped += 1;
            return;
        }

        let url = match self.site_url.join(&item.href) {
            Ok(url) => url,
            Err(e) => {
                warn!(href = %item.href, error = %e, "bad entry href");
                summary.errors.push((item.href.clone(), e.to_string()));
                return;
            }
        };

        info!(prefix, number, title = %item.title, "downloading transcript");
        match self.download(url.as_str()).await {
            Ok(content) => {
                if let Err(e) = write_file(&dest, &content).await {
                    warn!(path = %dest.display(), error = %e, "failed to store transcript");
                    summary.errors.push((url.to_string(), e.to_string()));
                    return;
                }
                progress.transcript_downloaded(prefix, number, &item.title);
                summary.downloaded += 1;
            }
            Err(e) => {
                warn!(%url, error = %e, "transcript download failed");
                summary.errors.push((url.to_string(), e.to_string()));
            }
        }
    }

    /// Fetch one list page, using the on-disk cache for deep archive pages.
    ///
    /// The first few pages are always re-downloaded to catch new episodes;
    /// pages beyond `cache_after_page` change rarely and are cached
    /// indefinitely unless a refresh is forced.
    async fn list_page(&self, page: u32, data_dir: &Path) -> Result<String> {
        let cache_file = data_dir.join(format!("transcripts_page_{page}.html"));

        if !self.options.refresh_list
            && page > self.options.cache_after_page
            && cache_file.exists()
        {
            debug!(page, "serving list page from cache");
            return fs::read_to_string(&cache_file)
                .await
                .map_err(|e| CastpackError::io(&cache_file, e));
        }

        let mut url = self.list_url.clone();
        if page > 1 {
            url.query_pairs_mut()
                .append_pair("page", &page.to_string());
        }

        info!(page, %url, "downloading list page");
        let content = self.download(url.as_str()).await?;

        write_file(&cache_file, &content).await?;
        Ok(content)
    }

    /// GET a URL with retries and a politeness delay between requests.
    async fn download(&self, url: &str) -> Result<String> {
        let mut last_err: Option<CastpackError> = None;

        for attempt in 1..=self.options.retries.max(1) {
            match self.try_get(url).await {
                Ok(body) => {
                    if self.options.rate_limit_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.options.rate_limit_ms))
                            .await;
                    }
                    return Ok(body);
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "request failed");
                    last_err = Some(e);
                    if self.options.retry_delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.options.retry_delay_ms))
                            .await;
                    }
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| CastpackError::Network(format!("{url}: failed after retries"))))
    }

    async fn try_get(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CastpackError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CastpackError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| CastpackError::Network(format!("{url}: body read failed: {e}")))
    }
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .await
        .map_err(|e| CastpackError::io(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
