//! Error types for the library layer.

use std::time::Duration;

use thiserror::Error;

/// Why one source adapter produced nothing. Always recovered locally by the chain.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport failure or non-success status from the fetcher.
    #[error("fetch failed: {0}")]
    Fetch(#[from] disclosure_api::Error),
    /// The document arrived but did not have the expected structure.
    #[error("unexpected document shape: {0}")]
    Shape(String),
    /// A background task (PDF text extraction) died.
    #[error("background task failed: {0}")]
    Join(String),
}

/// The chain produced no batch: every adapter came back empty or failed, or
/// the request deadline passed first.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("all sources failed: {}", attempted.join(", "))]
    Exhausted { attempted: Vec<String> },
    #[error("no source finished within {budget:?}: {}", attempted.join(", "))]
    TimedOut {
        budget: Duration,
        attempted: Vec<String>,
    },
}

/// Problems loading configuration or seed data.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse denylist YAML: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("unknown source adapter '{0}'")]
    UnknownSource(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced to the caller of the service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<disclosure_api::Error> for ServiceError {
    fn from(e: disclosure_api::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
