//! OpenInsider screener: one HTML table, one row per insider transaction.

use async_trait::async_trait;
use disclosure_api::Client;

use super::OPENINSIDER;
use crate::chain::{RequestContext, SourceAdapter};
use crate::error::SourceError;
use crate::extract::{Extractor, TableExtractor, TableLayout};
use crate::model::{FilingContext, TradeFact};
use crate::normalize::isolate_table;

pub struct OpenInsiderAdapter {
    client: Client,
    base_url: String,
    rows: usize,
    extractor: TableExtractor,
}

impl OpenInsiderAdapter {
    pub fn new(client: Client, base_url: &str, rows: usize, min_value: f64) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rows: rows.clamp(1, 1000),
            extractor: TableExtractor::new(TableLayout::openinsider().with_min_value(min_value)),
        }
    }

    fn screener_url(&self) -> String {
        format!(
            "{}/screener?fd=30&xp=1&xs=1&sortcol=0&cnt={}&page=1",
            self.base_url, self.rows
        )
    }
}

#[async_trait]
impl SourceAdapter for OpenInsiderAdapter {
    fn name(&self) -> &str {
        OPENINSIDER
    }

    async fn fetch_trades(&self, _ctx: &RequestContext) -> Result<Vec<TradeFact>, SourceError> {
        let url = self.screener_url();
        let html = self.client.get_text(&url).await?;
        let table = isolate_table(&html, "tinytable")
            .ok_or_else(|| SourceError::Shape("screener table missing".into()))?;
        let ctx = FilingContext::listing(OPENINSIDER, &url);
        Ok(self.extractor.extract_batch(table, &ctx))
    }
}
