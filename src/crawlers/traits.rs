use crate::crawlers::client::HttpClient;
use crate::error::CrawlError;
use crate::models::Expose;
use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use tracing::{debug, warn};

/// Common trait for all listing crawlers.
///
/// An implementation supplies its URL pattern, an HTTP client and
/// `extract_data`; the provided methods form the fetch/parse/extract
/// pipeline and can be overridden for sites that need more (pagination,
/// detail pages).
#[async_trait]
pub trait Crawler: Send + Sync {
    /// Search URLs this crawler accepts. Matched anywhere in the URL.
    fn url_pattern(&self) -> &Regex;

    fn http(&self) -> &HttpClient;

    /// Pull the listings out of a parsed search page
    fn extract_data(&self, document: &Html) -> Vec<Expose>;

    /// Name of the crawler, used by callers for display and logging
    fn get_name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        let path = full.split('<').next().unwrap_or(full);
        path.rsplit("::").next().unwrap_or(path)
    }

    /// Load as many exposes as possible from `url`.
    ///
    /// URLs not matching [`Crawler::url_pattern`] yield nothing without any
    /// request being made. A host that cannot be reached is logged and also
    /// yields nothing; every other error is returned.
    async fn crawl(&self, url: &str, max_pages: Option<u32>) -> Result<Vec<Expose>, CrawlError> {
        if !self.url_pattern().is_match(url) {
            return Ok(Vec::new());
        }

        match self.get_results(url, max_pages).await {
            Err(CrawlError::Connection { url, .. }) => {
                warn!("Connection to {} failed", host_of(&url));
                Ok(Vec::new())
            }
            result => result,
        }
    }

    /// Fetch the first page of a search and extract its exposes.
    /// `max_pages` is left to implementations that paginate.
    async fn get_results(
        &self,
        search_url: &str,
        _max_pages: Option<u32>,
    ) -> Result<Vec<Expose>, CrawlError> {
        debug!("Got search URL {}", search_url);

        let soup = self.get_page(search_url, None).await?;
        let entries = self.extract_data(&soup);
        debug!("Number of found entries: {}", entries.len());

        Ok(entries)
    }

    /// Fetch one page of a search. The base ignores `page_no`.
    async fn get_page(&self, search_url: &str, _page_no: Option<u32>) -> Result<Html, CrawlError> {
        self.get_soup_from_url(search_url).await
    }

    async fn get_soup_from_url(&self, url: &str) -> Result<Html, CrawlError> {
        self.http().get_document(url).await
    }

    /// Load additional details for an expose. Returns it unchanged by default.
    async fn get_expose_details(&self, expose: Expose) -> Result<Expose, CrawlError> {
        Ok(expose)
    }
}

/// Host part of a URL, or the URL itself if it cannot be parsed
pub(crate) fn host_of(url: &str) -> &str {
    url.split('/').nth(2).filter(|host| !host.is_empty()).unwrap_or(url)
}
