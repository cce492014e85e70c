//! Third-party aggregator feed: already structured, mapped field by field.

use async_trait::async_trait;
use disclosure_api::types::{Trade, TxType};
use disclosure_api::{Client, TradeQuery};

use super::CAPITOL_TRADES;
use crate::chain::{RequestContext, SourceAdapter};
use crate::dedup::dedup;
use crate::error::SourceError;
use crate::model::{Amount, Ticker, TradeFact, TransactionType, UNKNOWN};

pub struct CapitolTradesAdapter {
    client: Client,
    base_url: String,
    query: TradeQuery,
}

impl CapitolTradesAdapter {
    pub fn new(client: Client, base_url: &str, page_size: usize, days: i64) -> Self {
        let query = TradeQuery::default()
            .with_page_size(page_size.clamp(1, 100) as i64)
            .with_pub_date_relative(days.max(1));
        Self {
            client,
            base_url: base_url.to_string(),
            query,
        }
    }
}

#[async_trait]
impl SourceAdapter for CapitolTradesAdapter {
    fn name(&self) -> &str {
        CAPITOL_TRADES
    }

    async fn fetch_trades(&self, _ctx: &RequestContext) -> Result<Vec<TradeFact>, SourceError> {
        let page = self.client.get_trades(&self.base_url, &self.query).await?;
        Ok(dedup(page.data.iter().map(trade_to_fact).collect()))
    }
}

pub fn trade_to_fact(trade: &Trade) -> TradeFact {
    let raw_ticker = trade
        .asset
        .as_ref()
        .and_then(|a| a.asset_ticker.as_deref())
        .or(trade.issuer.issuer_ticker.as_deref())
        .unwrap_or_default();

    let amount = match (trade.value, trade.size_range_low, trade.size_range_high) {
        (Some(value), _, _) if value > 0 => Amount::Value(value as f64),
        (_, Some(low), Some(high)) => Amount::Range {
            min: low as f64,
            max: high as f64,
        },
        _ => Amount::unknown(),
    };

    let politician = &trade.politician;
    let state = politician
        .state_id
        .as_deref()
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty());
    let role = match (politician.chamber, state) {
        (Some(chamber), Some(state)) => format!("{chamber} — {state}"),
        (Some(chamber), None) => chamber.to_string(),
        (None, Some(state)) => state,
        (None, None) => UNKNOWN.to_string(),
    };

    TradeFact {
        subject: politician.display_name(),
        role,
        ticker: Ticker::parse(raw_ticker),
        company: trade.issuer.issuer_name.trim().to_string(),
        transaction_type: match trade.tx_type {
            TxType::Buy => TransactionType::Purchase,
            TxType::Sell => TransactionType::Sale,
            TxType::Exchange => TransactionType::Exchange,
            TxType::Receive | TxType::Other => TransactionType::Unknown,
        },
        amount,
        description: trade.asset.as_ref().and_then(|a| a.asset_type.clone()),
        trade_date: trade.tx_date,
        filed_date: trade
            .filing_date
            .or_else(|| trade.pub_date.map(|d| d.date_naive())),
        source_url: trade.filing_url.clone(),
        origin: CAPITOL_TRADES.to_string(),
    }
}
