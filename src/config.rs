use crate::error::CrawlError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/84.0.4147.105 Safari/537.36";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Headers every request carries, apart from `User-Agent` and `Accept-Language`.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("Connection", "keep-alive"),
    ("Pragma", "no-cache"),
    ("Cache-Control", "no-cache"),
    ("Upgrade-Insecure-Requests", "1"),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9",
    ),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-User", "?1"),
    ("Sec-Fetch-Dest", "document"),
];

/// HTTP settings shared by all crawlers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Whole-request timeout in seconds, none by default
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
    pub accept_language: String,
    /// Added on top of the browser headers, replacing any with the same name
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            extra_headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Load a config from a JSON file. Missing fields fall back to the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CrawlError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CrawlError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| CrawlError::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Build the header template sent with every request
    pub fn headers(&self) -> Result<HeaderMap, CrawlError> {
        let mut headers = HeaderMap::new();

        let fixed = BROWSER_HEADERS.iter().copied().chain([
            ("User-Agent", self.user_agent.as_str()),
            ("Accept-Language", self.accept_language.as_str()),
        ]);
        let extra = self
            .extra_headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()));

        for (name, value) in fixed.chain(extra) {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                CrawlError::InvalidHeader {
                    name: name.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| CrawlError::InvalidHeader {
                    name: name.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}
