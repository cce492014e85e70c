//! Trade records as served by the third-party aggregator feed.
//!
//! Only the fields the normalizer reads are modelled; everything is optional
//! because the feed drops keys freely between releases.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    #[serde(rename = "_txId")]
    pub tx_id: i64,

    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub filing_date: Option<NaiveDate>,

    #[serde(default)]
    pub tx_date: Option<NaiveDate>,

    pub tx_type: TxType,

    #[serde(default)]
    pub value: Option<i64>,

    #[serde(default)]
    pub size_range_low: Option<i64>,

    #[serde(default)]
    pub size_range_high: Option<i64>,

    #[serde(rename = "filingURL", default)]
    pub filing_url: Option<String>,

    #[serde(default)]
    pub asset: Option<Asset>,

    pub issuer: Issuer,

    pub politician: Politician,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(default)]
    pub asset_type: Option<String>,

    #[serde(default)]
    pub asset_ticker: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    pub issuer_name: String,

    #[serde(default)]
    pub issuer_ticker: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Politician {
    /// Two-letter US state code, lowercase upstream.
    #[serde(rename = "_stateId", default)]
    pub state_id: Option<String>,

    #[serde(default)]
    pub chamber: Option<Chamber>,

    pub first_name: String,

    pub last_name: String,

    #[serde(default)]
    pub nickname: Option<String>,
}

impl Politician {
    /// Display name, preferring the nickname over the legal first name.
    pub fn display_name(&self) -> String {
        let first = self
            .nickname
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.first_name);
        format!("{} {}", first.trim(), self.last_name.trim())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Chamber {
    House,
    Senate,
}
impl std::fmt::Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Chamber::House => "House",
                Chamber::Senate => "Senate",
            }
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TxType {
    Buy,
    Sell,
    Exchange,
    Receive,
    #[serde(other)]
    Other,
}
impl std::fmt::Display for TxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TxType::Buy => "buy",
                TxType::Sell => "sell",
                TxType::Exchange => "exchange",
                TxType::Receive => "receive",
                TxType::Other => "other",
            }
        )
    }
}
