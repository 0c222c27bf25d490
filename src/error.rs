use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// The remote host could not be reached at all.
    #[error("Connection to {url} failed")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response body from {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid URL {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid URL pattern")]
    Pattern(#[from] regex::Error),

    #[error("Invalid header {name}")]
    InvalidHeader { name: String },

    #[error("Failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Failed to read config file {path}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}")]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CrawlError {
    /// Sorts a failed `send` into a connection failure or a generic request failure.
    pub fn from_request(url: &str, source: reqwest::Error) -> Self {
        if source.is_connect() {
            Self::Connection {
                url: url.to_string(),
                source,
            }
        } else {
            Self::Request {
                url: url.to_string(),
                source,
            }
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
