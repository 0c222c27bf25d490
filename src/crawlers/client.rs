use crate::config::ClientConfig;
use crate::error::CrawlError;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use scraper::Html;
use tracing::{debug, error};

/// HTTP client carrying the browser header template
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    headers: HeaderMap,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self, CrawlError> {
        let headers = config.headers()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(CrawlError::Client)?;

        Ok(Self { client, headers })
    }

    /// Fetch `url` and parse whatever body comes back.
    ///
    /// A status other than 200 is logged but does not fail the call.
    pub async fn get_document(&self, url: &str) -> Result<Html, CrawlError> {
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|source| CrawlError::from_request(url, source))?;

        let status = response.status();
        // Decoded with the charset from Content-Type, UTF-8 if there is none
        let body = response.text().await.map_err(|source| CrawlError::Body {
            url: url.to_string(),
            source,
        })?;

        if status != StatusCode::OK {
            error!("Got response ({}): {}", status.as_u16(), body);
        } else {
            debug!("Downloaded {} bytes of HTML", body.len());
        }

        Ok(Html::parse_document(&body))
    }
}
