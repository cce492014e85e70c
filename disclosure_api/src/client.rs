//! HTTP client shared by every upstream source.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    query::TradeQuery,
    types::{PaginatedResponse, Trade},
    user_agent::get_user_agent,
    Error,
};

/// Settings for [`Client`].
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Overrides the default identifying user agent.
    pub user_agent: Option<String>,
    /// Hard ceiling for a single request, connect through body.
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout: Duration::from_secs(15),
        }
    }
}

/// A successfully fetched document.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl Fetched {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Document fetcher.
///
/// One `reqwest::Client` is built up front and reused, so connection pooling
/// works across the concurrent per-filing fetches. Every request carries the
/// configured timeout; there are no retries.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
}

impl Client {
    pub fn new(options: &ClientOptions) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent(options.user_agent.as_deref()))
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::Transport {
                url: String::new(),
                source: e,
            })?;
        Ok(Self { http })
    }

    /// Fetches `url`, returning the raw body on a 2xx status.
    pub async fn fetch(&self, url: &str) -> Result<Fetched, Error> {
        let parsed = Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
        let resp = self
            .http
            .get(parsed)
            .header("accept", "text/html,application/xhtml+xml,application/xml,application/json;q=0.9,*/*;q=0.8")
            .header("accept-language", "en-US,en;q=0.9")
            .header("cache-control", "no-cache")
            .send()
            .await
            .map_err(|e| Error::Transport {
                url: url.to_string(),
                source: e,
            })?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| Error::Transport {
            url: url.to_string(),
            source: e,
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&String::from_utf8_lossy(&body));
            tracing::error!("Request to {} failed with status {}: {}", url, status, snippet);
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(Fetched {
            url: url.to_string(),
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }

    /// Fetches `url` and decodes the body as (lossy) UTF-8 text.
    pub async fn get_text(&self, url: &str) -> Result<String, Error> {
        Ok(self.fetch(url).await?.text())
    }

    /// Fetches `url` and deserializes the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let fetched = self.fetch(url).await?;
        serde_json::from_slice::<T>(&fetched.body).map_err(|e| {
            let snippet = truncate_body(&fetched.text());
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::Json {
                url: url.to_string(),
                source: e,
            }
        })
    }

    /// Fetches one page of the aggregator's trade feed rooted at `base_url`.
    pub async fn get_trades(
        &self,
        base_url: &str,
        query: &TradeQuery,
    ) -> Result<PaginatedResponse<Trade>, Error> {
        let root = format!("{}/trades", base_url.trim_end_matches('/'));
        let url = Url::parse(&root).map_err(|_| Error::InvalidUrl(root.clone()))?;
        let url = query.add_to_url(&url);
        self.get_json::<PaginatedResponse<Trade>>(url.as_str()).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
