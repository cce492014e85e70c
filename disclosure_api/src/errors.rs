//! Error types for the document fetcher.

/// Errors that can occur when fetching an upstream document.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request never produced a response (connect error, timeout, body read failure).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The upstream answered with a non-success status. `body` is a truncated snippet.
    #[error("request to {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },
    /// The URL could not be parsed.
    #[error("invalid url {0}")]
    InvalidUrl(String),
    /// The body was not the JSON shape the caller asked for.
    #[error("failed to parse json from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// True when the failure was the client-side timeout firing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport { source, .. } if source.is_timeout())
    }
}
