//! Senate eFD: JSON report listing, one HTML page per electronic PTR.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use disclosure_api::types::{ReportListing, ReportRow};
use disclosure_api::Client;
use regex::Regex;
use tracing::debug;

use super::batch::{extract_filings, most_recent, FilingDetail};
use super::{absolute_url, SENATE_EFD};
use crate::chain::{RequestContext, SourceAdapter};
use crate::config::ServiceConfig;
use crate::error::SourceError;
use crate::extract::{Extractor, TableExtractor, TableLayout};
use crate::model::{FilingContext, FilingReference, TradeFact};
use crate::normalize::{isolate_table, normalize_date, strip_html};

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).expect("valid href regex"));

/// Report type id of periodic transaction reports in the search API.
const PTR_REPORT_TYPE: &str = "11";

pub struct SenateEfdAdapter {
    client: Client,
    base_url: String,
    report_path: String,
    max_filings: usize,
    concurrency: usize,
    detail: Arc<dyn FilingDetail>,
}

struct SenateDetail {
    client: Client,
    extractor: TableExtractor,
}

#[async_trait]
impl FilingDetail for SenateDetail {
    async fn facts(&self, filing: &FilingReference) -> Result<Vec<TradeFact>, SourceError> {
        let html = self.client.get_text(&filing.document_url).await?;
        let Some(table) =
            isolate_table(&html, "table-striped").or_else(|| isolate_table(&html, "<table"))
        else {
            debug!(document = %filing.document_id, "No transaction table on report page");
            return Ok(Vec::new());
        };
        let ctx = FilingContext::for_filing(filing, SENATE_EFD);
        Ok(self.extractor.extract_batch(table, &ctx))
    }
}

impl SenateEfdAdapter {
    pub fn new(client: Client, base_url: &str, report_path: &str, config: &ServiceConfig) -> Self {
        Self {
            detail: Arc::new(SenateDetail {
                client: client.clone(),
                extractor: TableExtractor::new(TableLayout::senate_ptr()),
            }),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            report_path: report_path.to_string(),
            max_filings: config.max_filings,
            concurrency: config.concurrency,
        }
    }

    fn listing_url(&self) -> String {
        format!(
            "{}/{}?report_types=%5B{PTR_REPORT_TYPE}%5D&start=0&length={}",
            self.base_url,
            self.report_path.trim_start_matches('/'),
            self.max_filings
        )
    }
}

#[async_trait]
impl SourceAdapter for SenateEfdAdapter {
    fn name(&self) -> &str {
        SENATE_EFD
    }

    async fn fetch_trades(&self, _ctx: &RequestContext) -> Result<Vec<TradeFact>, SourceError> {
        let listing: ReportListing = self.client.get_json(&self.listing_url()).await?;
        let filings: Vec<FilingReference> = listing
            .rows()
            .iter()
            .filter_map(|row| row_to_filing(row, &self.base_url))
            .collect();
        debug!(filings = filings.len(), "Parsed Senate report listing");
        if filings.is_empty() {
            return Ok(Vec::new());
        }
        let filings = most_recent(filings, self.max_filings);
        Ok(extract_filings(Arc::clone(&self.detail), filings, SENATE_EFD, self.concurrency).await)
    }
}

/// A listing row becomes a filing when its link cell carries an href.
pub fn row_to_filing(row: &ReportRow, base_url: &str) -> Option<FilingReference> {
    let href = HREF.captures(&row.link_html)?.get(1)?.as_str();
    let document_url = absolute_url(base_url, href);
    let document_id = document_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let filed_date = normalize_date(&row.filed_date);
    let subject = format!("{} {}", row.first_name, row.last_name).trim().to_string();
    let office = strip_html(&row.office);
    Some(FilingReference {
        subject,
        role: if office.is_empty() {
            "Senate".to_string()
        } else {
            format!("Senate — {office}")
        },
        filed_date,
        document_id,
        document_year: filed_date.map(|d| chrono::Datelike::year(&d)),
        document_url,
    })
}
