//! Document fetching for disclosure-feed.
//!
//! A thin wrapper over `reqwest` that every upstream source goes through: one
//! shared client with a fixed timeout and an identifying user agent, plus the
//! wire types of the structured upstream feeds.

mod client;
mod errors;
mod query;
pub mod types;
pub mod user_agent;
pub use self::client::{Client, ClientOptions, Fetched};
pub use self::errors::Error;
pub use self::query::TradeQuery;
