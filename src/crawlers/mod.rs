pub mod booli;
pub mod client;
pub mod registry;
pub mod traits;

pub use booli::BooliCrawler;
pub use client::HttpClient;
pub use registry::CrawlerRegistry;
pub use traits::Crawler;
