//! Crawlers that fetch real-estate search pages and extract the listings on them.

pub mod config;
pub mod crawlers;
pub mod error;
pub mod models;

pub use config::ClientConfig;
pub use crawlers::{BooliCrawler, Crawler, CrawlerRegistry, HttpClient};
pub use error::CrawlError;
pub use models::Expose;
