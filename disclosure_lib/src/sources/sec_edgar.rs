//! SEC EDGAR: Atom feed of current Form 4 filings, one text submission each.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use disclosure_api::Client;
use tracing::debug;

use super::batch::{extract_filings, most_recent, FilingDetail};
use super::SEC_EDGAR;
use crate::chain::{RequestContext, SourceAdapter};
use crate::config::ServiceConfig;
use crate::error::SourceError;
use crate::extract::xml::{parse_document, Element};
use crate::extract::{Extractor, XmlExtractor};
use crate::model::{FilingContext, FilingReference, TradeFact, UNKNOWN};
use crate::normalize::{collapse_whitespace, normalize_date};

pub struct SecEdgarAdapter {
    client: Client,
    base_url: String,
    max_filings: usize,
    concurrency: usize,
    detail: Arc<dyn FilingDetail>,
}

struct EdgarDetail {
    client: Client,
    extractor: XmlExtractor,
}

#[async_trait]
impl FilingDetail for EdgarDetail {
    async fn facts(&self, filing: &FilingReference) -> Result<Vec<TradeFact>, SourceError> {
        let text = self.client.get_text(&filing.document_url).await?;
        let ctx = FilingContext::for_filing(filing, SEC_EDGAR);
        Ok(self.extractor.extract_batch(&text, &ctx))
    }
}

impl SecEdgarAdapter {
    pub fn new(client: Client, base_url: &str, config: &ServiceConfig) -> Self {
        Self {
            detail: Arc::new(EdgarDetail {
                client: client.clone(),
                extractor: XmlExtractor::default(),
            }),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_filings: config.max_filings,
            concurrency: config.concurrency,
        }
    }

    fn feed_url(&self) -> String {
        // Each filing is listed once per party, so ask for twice as many entries.
        format!(
            "{}/cgi-bin/browse-edgar?action=getcurrent&type=4&company=&dateb=&owner=include&start=0&count={}&output=atom",
            self.base_url,
            (self.max_filings * 2).clamp(10, 100)
        )
    }
}

#[async_trait]
impl SourceAdapter for SecEdgarAdapter {
    fn name(&self) -> &str {
        SEC_EDGAR
    }

    async fn fetch_trades(&self, _ctx: &RequestContext) -> Result<Vec<TradeFact>, SourceError> {
        let feed = self.client.get_text(&self.feed_url()).await?;
        let filings = parse_form4_feed(&feed)?;
        debug!(filings = filings.len(), "Parsed EDGAR current feed");
        if filings.is_empty() {
            return Ok(Vec::new());
        }
        let filings = most_recent(filings, self.max_filings);
        Ok(extract_filings(Arc::clone(&self.detail), filings, SEC_EDGAR, self.concurrency).await)
    }
}

/// Form 4 entries of an EDGAR Atom feed, one per accession number.
///
/// Titles look like `4 - Cook Timothy D (0001214156) (Reporting)`. The
/// `(Reporting)` entry names the insider, so it wins over the `(Issuer)` one.
pub fn parse_form4_feed(atom: &str) -> Result<Vec<FilingReference>, SourceError> {
    let doc = parse_document(atom)
        .ok_or_else(|| SourceError::Shape("EDGAR feed is not well-formed XML".into()))?;
    if doc.find("feed").is_none() {
        return Err(SourceError::Shape("EDGAR response is not an Atom feed".into()));
    }

    let mut filings: Vec<FilingReference> = Vec::new();
    let mut reporting: HashSet<String> = HashSet::new();
    for entry in doc.find_all("entry") {
        let title = text(entry, "title");
        let Some((form, rest)) = title.split_once(" - ") else {
            continue;
        };
        if !matches!(form.trim(), "4" | "4/A") {
            continue;
        }
        let Some(href) = entry.child("link").and_then(|l| l.attr("href")) else {
            continue;
        };
        let accession = accession_number(entry, href);
        let is_reporting = rest.contains("(Reporting)");

        let filing = FilingReference {
            subject: filer_name(rest),
            role: UNKNOWN.to_string(),
            filed_date: normalize_date(text(entry, "updated")),
            document_id: accession.clone(),
            document_year: None,
            document_url: submission_text_url(href),
        };

        match filings.iter().position(|f| f.document_id == accession) {
            Some(idx) if is_reporting && !reporting.contains(&accession) => {
                filings[idx] = filing;
                reporting.insert(accession);
            }
            Some(_) => {}
            None => {
                if is_reporting {
                    reporting.insert(accession);
                }
                filings.push(filing);
            }
        }
    }
    Ok(filings)
}

fn text<'a>(entry: &'a Element, name: &str) -> &'a str {
    entry.child(name).and_then(Element::value).unwrap_or_default()
}

/// `Cook Timothy D (0001214156) (Reporting)` -> `Cook Timothy D`.
fn filer_name(rest: &str) -> String {
    let name = match rest.find(" (") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    collapse_whitespace(name)
}

fn accession_number(entry: &Element, href: &str) -> String {
    let id = text(entry, "id");
    if let Some((_, acc)) = id.split_once("accession-number=") {
        return acc.trim().to_string();
    }
    href.rsplit('/')
        .next()
        .unwrap_or(href)
        .trim_end_matches("-index.htm")
        .to_string()
}

/// The filing index page link rewritten to the full submission text.
fn submission_text_url(href: &str) -> String {
    match href.strip_suffix("-index.htm") {
        Some(stem) => format!("{stem}.txt"),
        None => match href.strip_suffix("-index.html") {
            Some(stem) => format!("{stem}.txt"),
            None => href.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const FEED: &str = r#"<?xml version="1.0" encoding="ISO-8859-1" ?>
<feed xmlns="http://www.w3.org/2005/Atom">
<title>Latest Filings - Tue, 09 Dec 2025 16:10:00 EST</title>
<entry>
<title>4 - Apple Inc. (0000320193) (Issuer)</title>
<link rel="alternate" type="text/html" href="https://www.sec.gov/Archives/edgar/data/320193/000112760225000001/0001127602-25-000001-index.htm"/>
<updated>2025-12-09T16:05:22-05:00</updated>
<id>urn:tag:sec.gov,2008:accession-number=0001127602-25-000001</id>
</entry>
<entry>
<title>4 - Cook Timothy D (0001214156) (Reporting)</title>
<link rel="alternate" type="text/html" href="https://www.sec.gov/Archives/edgar/data/1214156/000112760225000001/0001127602-25-000001-index.htm"/>
<updated>2025-12-09T16:05:22-05:00</updated>
<id>urn:tag:sec.gov,2008:accession-number=0001127602-25-000001</id>
</entry>
<entry>
<title>8-K - Widget Corp (0000000001) (Filer)</title>
<link rel="alternate" type="text/html" href="https://www.sec.gov/Archives/edgar/data/1/0000000001-25-000002-index.htm"/>
<updated>2025-12-09T16:00:00-05:00</updated>
<id>urn:tag:sec.gov,2008:accession-number=0000000001-25-000002</id>
</entry>
<entry>
<title>4/A - Doe Jane (0000000003) (Reporting)</title>
<link rel="alternate" type="text/html" href="https://www.sec.gov/Archives/edgar/data/3/0000000003-25-000004-index.htm"/>
<updated>2025-12-08T09:00:00-05:00</updated>
<id>urn:tag:sec.gov,2008:accession-number=0000000003-25-000004</id>
</entry>
</feed>"#;

    #[test]
    fn one_filing_per_accession_preferring_reporting_owner() {
        let filings = parse_form4_feed(FEED).unwrap();
        assert_eq!(filings.len(), 2);
        assert_eq!(filings[0].subject, "Cook Timothy D");
        assert_eq!(filings[0].document_id, "0001127602-25-000001");
        assert_eq!(
            filings[0].document_url,
            "https://www.sec.gov/Archives/edgar/data/1214156/000112760225000001/0001127602-25-000001.txt"
        );
        assert_eq!(filings[0].filed_date, NaiveDate::from_ymd_opt(2025, 12, 9));
        assert_eq!(filings[1].subject, "Doe Jane");
    }

    #[test]
    fn non_feed_documents_are_shape_errors() {
        assert!(matches!(
            parse_form4_feed("<html><body>Request Rate Threshold Exceeded</body></html>"),
            Err(SourceError::Shape(_))
        ));
    }

    #[test]
    fn accession_falls_back_to_link() {
        let doc = parse_document("<entry><id>tag:x</id></entry>").unwrap();
        let entry = doc.find("entry").unwrap();
        assert_eq!(
            accession_number(entry, "https://x/0001-25-000009-index.htm"),
            "0001-25-000009"
        );
    }
}
