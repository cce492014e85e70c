//! Library layer for disclosure-feed: extraction, source chains and report assembly.
//!
//! Wraps the `disclosure_api` fetcher with the text normalizer, the three
//! extraction strategies, the per-endpoint adapter chains, deduplication,
//! clustering and the report assembler.

pub mod chain;
pub mod cluster;
pub mod config;
pub mod dedup;
pub mod denylist;
pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod service;
pub mod sources;

pub use disclosure_api;

pub use chain::{AdapterChain, Attempt, AttemptOutcome, ChainOutcome, RequestContext, SourceAdapter};
pub use cluster::cluster;
pub use config::{ServiceConfig, SourceUrls};
pub use dedup::dedup;
pub use denylist::Denylist;
pub use error::{ChainError, ConfigError, ServiceError, SourceError};
pub use extract::{Extractor, StreamExtractor, SynonymTable, TableExtractor, TableLayout, XmlExtractor, XmlField};
pub use model::{Amount, FilingContext, FilingReference, Ticker, TickerCluster, TradeFact, TransactionType};
pub use service::{assemble, Endpoint, ReportOptions, TradeReport, TradeService};
