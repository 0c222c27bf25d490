use crate::crawlers::traits::Crawler;
use crate::error::CrawlError;
use crate::models::{crawler_of, Expose, CRAWLER_KEY};
use serde_json::Value;
use tracing::{error, info};

/// Runs every search URL through every registered crawler
#[derive(Default)]
pub struct CrawlerRegistry {
    crawlers: Vec<Box<dyn Crawler>>,
}

impl CrawlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, crawler: Box<dyn Crawler>) {
        self.crawlers.push(crawler);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.crawlers.iter().map(|c| c.get_name()).collect()
    }

    /// Crawl each URL with each crawler and collect the results.
    ///
    /// Every expose is tagged with the name of the crawler that found it. A
    /// failing crawler is logged and skipped.
    pub async fn crawl_all(&self, urls: &[String], max_pages: Option<u32>) -> Vec<Expose> {
        let mut all_exposes = Vec::new();

        for url in urls {
            for crawler in &self.crawlers {
                match crawler.crawl(url, max_pages).await {
                    Ok(exposes) => {
                        if !exposes.is_empty() {
                            info!("Found {} exposes from {}", exposes.len(), crawler.get_name());
                        }
                        all_exposes.extend(exposes.into_iter().map(|mut expose| {
                            expose.insert(
                                CRAWLER_KEY.to_string(),
                                Value::String(crawler.get_name().to_string()),
                            );
                            expose
                        }));
                    }
                    Err(e) => {
                        error!("Failed to crawl {} with {}: {}", url, crawler.get_name(), e);
                    }
                }
            }
        }

        all_exposes
    }

    /// Load details for an expose through the crawler that produced it.
    /// Exposes without a registered crawler come back unchanged.
    pub async fn expose_details(&self, expose: Expose) -> Result<Expose, CrawlError> {
        let crawler = crawler_of(&expose)
            .and_then(|name| self.crawlers.iter().find(|c| c.get_name() == name));

        match crawler {
            Some(crawler) => crawler.get_expose_details(expose).await,
            None => Ok(expose),
        }
    }
}
