//! House Clerk: yearly XML index of filings, one PDF per PTR.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Datelike;
use disclosure_api::Client;
use tracing::debug;

use super::batch::{extract_filings, most_recent, FilingDetail};
use super::{document_text, HOUSE_CLERK};
use crate::chain::{RequestContext, SourceAdapter};
use crate::config::ServiceConfig;
use crate::denylist::Denylist;
use crate::error::SourceError;
use crate::extract::xml::{parse_document, Element};
use crate::extract::{Extractor, StreamExtractor};
use crate::model::{FilingContext, FilingReference, TradeFact};
use crate::normalize::{flatten_pdf_text, normalize_date};

/// Index rows with this filing type are periodic transaction reports.
const PTR_FILING_TYPE: &str = "P";

pub struct HouseClerkAdapter {
    client: Client,
    base_url: String,
    year: Option<i32>,
    max_filings: usize,
    concurrency: usize,
    detail: Arc<dyn FilingDetail>,
}

struct HouseDetail {
    client: Client,
    extractor: StreamExtractor,
}

#[async_trait]
impl FilingDetail for HouseDetail {
    async fn facts(&self, filing: &FilingReference) -> Result<Vec<TradeFact>, SourceError> {
        let fetched = self.client.fetch(&filing.document_url).await?;
        debug!(
            url = %fetched.url,
            status = fetched.status,
            bytes = fetched.body.len(),
            "Fetched filing document"
        );
        let text = flatten_pdf_text(&document_text(fetched.body).await?);
        let ctx = FilingContext::for_filing(filing, HOUSE_CLERK);
        Ok(self.extractor.extract_batch(&text, &ctx))
    }
}

impl HouseClerkAdapter {
    pub fn new(client: Client, base_url: &str, denylist: Denylist, config: &ServiceConfig) -> Self {
        let extractor = StreamExtractor::new(denylist.with_extra(&config.denylist_extra))
            .with_lookahead(config.lookahead);
        Self {
            detail: Arc::new(HouseDetail {
                client: client.clone(),
                extractor,
            }),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            year: None,
            max_filings: config.max_filings,
            concurrency: config.concurrency,
        }
    }

    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    fn index_url(&self, year: i32) -> String {
        format!("{}/public_disc/financial-pdfs/{year}FD.xml", self.base_url)
    }
}

#[async_trait]
impl SourceAdapter for HouseClerkAdapter {
    fn name(&self) -> &str {
        HOUSE_CLERK
    }

    async fn fetch_trades(&self, ctx: &RequestContext) -> Result<Vec<TradeFact>, SourceError> {
        let year = self.year.unwrap_or_else(|| ctx.today.year());
        let xml = self.client.get_text(&self.index_url(year)).await?;
        let filings = parse_house_index(&xml, &self.base_url, year)?;
        debug!(year, filings = filings.len(), "Parsed House index");
        if filings.is_empty() {
            return Ok(Vec::new());
        }
        let filings = most_recent(filings, self.max_filings);
        Ok(extract_filings(Arc::clone(&self.detail), filings, HOUSE_CLERK, self.concurrency).await)
    }
}

/// PTR rows of a House financial disclosure index.
pub fn parse_house_index(
    xml: &str,
    base_url: &str,
    index_year: i32,
) -> Result<Vec<FilingReference>, SourceError> {
    let doc = parse_document(xml)
        .ok_or_else(|| SourceError::Shape("House index is not well-formed XML".into()))?;
    let members = doc.find_all("Member");
    if members.is_empty() && doc.find("FinancialDisclosure").is_none() {
        return Err(SourceError::Shape("House index has no Member rows".into()));
    }

    let base = base_url.trim_end_matches('/');
    Ok(members
        .into_iter()
        .filter(|m| field(m, "FilingType").eq_ignore_ascii_case(PTR_FILING_TYPE))
        .filter_map(|m| {
            let doc_id = field(m, "DocID");
            if doc_id.is_empty() {
                return None;
            }
            let year = field(m, "Year").parse::<i32>().unwrap_or(index_year);
            let subject = [field(m, "First"), field(m, "Last")]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let district = field(m, "StateDst");
            let role = if district.is_empty() {
                "House".to_string()
            } else {
                format!("House — {district}")
            };
            Some(FilingReference {
                subject,
                role,
                filed_date: normalize_date(field(m, "FilingDate")),
                document_id: doc_id.to_string(),
                document_year: Some(year),
                document_url: format!("{base}/public_disc/ptr-pdfs/{year}/{doc_id}.pdf"),
            })
        })
        .collect())
}

fn field<'a>(member: &'a Element, name: &str) -> &'a str {
    member.child(name).and_then(Element::value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const INDEX: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<FinancialDisclosure>
  <Member>
    <Prefix>Hon.</Prefix><Last>Doe</Last><First>Jane</First><Suffix />
    <FilingType>P</FilingType><StateDst>CA12</StateDst><Year>2025</Year>
    <FilingDate>1/17/2025</FilingDate><DocID>20026590</DocID>
  </Member>
  <Member>
    <Last>Roe</Last><First>Richard</First>
    <FilingType>O</FilingType><StateDst>TX02</StateDst><Year>2025</Year>
    <FilingDate>5/15/2025</FilingDate><DocID>10059999</DocID>
  </Member>
  <Member>
    <Last>Poe</Last><First>Pat</First>
    <FilingType>P</FilingType><StateDst>NY14</StateDst>
    <FilingDate>2/03/2025</FilingDate><DocID></DocID>
  </Member>
</FinancialDisclosure>"#;

    #[test]
    fn keeps_only_ptr_rows_with_documents() {
        let filings = parse_house_index(INDEX, "https://clerk.test/", 2025).unwrap();
        assert_eq!(filings.len(), 1);
        let f = &filings[0];
        assert_eq!(f.subject, "Jane Doe");
        assert_eq!(f.role, "House — CA12");
        assert_eq!(f.filed_date, NaiveDate::from_ymd_opt(2025, 1, 17));
        assert_eq!(f.document_year, Some(2025));
        assert_eq!(
            f.document_url,
            "https://clerk.test/public_disc/ptr-pdfs/2025/20026590.pdf"
        );
    }

    #[test]
    fn rejects_documents_that_are_not_an_index() {
        assert!(matches!(
            parse_house_index("<html><body>maintenance</body></html>", "https://clerk.test", 2025),
            Err(SourceError::Shape(_))
        ));
        assert!(parse_house_index("<<<", "https://clerk.test", 2025).is_err());
    }

    #[test]
    fn empty_index_is_not_an_error() {
        let filings =
            parse_house_index("<FinancialDisclosure></FinancialDisclosure>", "https://clerk.test", 2025)
                .unwrap();
        assert!(filings.is_empty());
    }
}
