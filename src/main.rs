use anyhow::{Context, Result};
use clap::Parser;
use housing_crawler::{BooliCrawler, ClientConfig, CrawlerRegistry};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Crawl real-estate search pages and save the listings as JSON
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Search URLs to crawl
    #[arg(required = true)]
    urls: Vec<String>,

    /// JSON file with HTTP client settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of result pages to follow, for crawlers that paginate
    #[arg(short, long)]
    max_pages: Option<u32>,

    /// Load details for every expose found
    #[arg(short, long)]
    details: bool,

    #[arg(short, long, default_value = "exposes.json")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,html5ever=error,selectors=error".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ClientConfig::load(path).context("Failed to load config")?,
        None => ClientConfig::default(),
    };

    let mut registry = CrawlerRegistry::new();
    registry.register(Box::new(
        BooliCrawler::new(&config).context("Failed to create Booli crawler")?,
    ));
    info!("Crawlers: {}", registry.names().join(", "));

    let mut exposes = registry.crawl_all(&args.urls, args.max_pages).await;

    if args.details {
        let mut detailed = Vec::with_capacity(exposes.len());
        for expose in exposes {
            match registry.expose_details(expose.clone()).await {
                Ok(expose) => detailed.push(expose),
                Err(e) => {
                    warn!("Failed to load expose details: {}", e);
                    detailed.push(expose);
                }
            }
        }
        exposes = detailed;
    }

    info!("Crawled {} exposes", exposes.len());

    let json = serde_json::to_string_pretty(&exposes)?;
    tokio::fs::write(&args.output, json)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Saved exposes to {}", args.output.display());

    Ok(())
}
