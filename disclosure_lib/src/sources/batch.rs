//! Concurrent per-filing detail extraction with placeholder degradation.
//!
//! Uses Semaphore + JoinSet for bounded fan-out. Every task returns its filing
//! index, so the batch is reassembled in index order whatever order the
//! fetches finish in.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::model::{FilingReference, TradeFact};

/// Fetches one filing's document and extracts its facts.
#[async_trait]
pub trait FilingDetail: Send + Sync + 'static {
    async fn facts(&self, filing: &FilingReference) -> Result<Vec<TradeFact>, SourceError>;
}

/// Keeps the `max` most recently filed references; undated ones sort last.
pub fn most_recent(mut filings: Vec<FilingReference>, max: usize) -> Vec<FilingReference> {
    filings.sort_by(|a, b| b.filed_date.cmp(&a.filed_date));
    filings.truncate(max);
    filings
}

/// Runs `detail` for every filing, at most `concurrency` at a time.
///
/// A filing whose fetch fails, whose extraction comes back empty, or whose
/// task panics contributes exactly one placeholder fact, so the output never
/// has fewer records than there are filings.
pub async fn extract_filings(
    detail: Arc<dyn FilingDetail>,
    filings: Vec<FilingReference>,
    origin: &str,
    concurrency: usize,
) -> Vec<TradeFact> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for (idx, filing) in filings.iter().cloned().enumerate() {
        let sem = Arc::clone(&semaphore);
        let detail = Arc::clone(&detail);
        join_set.spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            (idx, detail.facts(&filing).await)
        });
    }

    let mut slots: Vec<Option<Result<Vec<TradeFact>, SourceError>>> =
        (0..filings.len()).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((idx, result)) => slots[idx] = Some(result),
            Err(e) => warn!(origin, error = %e, "Filing task failed"),
        }
    }

    let mut facts = Vec::new();
    let mut placeholders = 0usize;
    for (filing, slot) in filings.iter().zip(slots) {
        match slot {
            Some(Ok(found)) if !found.is_empty() => facts.extend(found),
            Some(Ok(_)) => {
                debug!(origin, document = %filing.document_id, "No transactions extracted");
                placeholders += 1;
                facts.push(TradeFact::placeholder(filing, origin));
            }
            Some(Err(e)) => {
                warn!(origin, document = %filing.document_id, error = %e, "Filing detail failed");
                placeholders += 1;
                facts.push(TradeFact::placeholder(filing, origin));
            }
            None => {
                placeholders += 1;
                facts.push(TradeFact::placeholder(filing, origin));
            }
        }
    }

    info!(
        origin,
        filings = filings.len(),
        facts = facts.len(),
        placeholders,
        "Extracted filing details"
    );
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, FilingContext, Ticker, TransactionType};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn filing(id: &str, day: Option<u32>) -> FilingReference {
        FilingReference {
            subject: format!("Filer {id}"),
            role: "House — TX-02".into(),
            filed_date: day.and_then(|d| NaiveDate::from_ymd_opt(2025, 6, d)),
            document_id: id.into(),
            document_year: Some(2025),
            document_url: format!("https://example.test/{id}.pdf"),
        }
    }

    struct Scripted;

    #[async_trait]
    impl FilingDetail for Scripted {
        async fn facts(&self, filing: &FilingReference) -> Result<Vec<TradeFact>, SourceError> {
            match filing.document_id.as_str() {
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    let ctx = FilingContext::for_filing(filing, "test");
                    Ok(vec![
                        ctx.fact(Ticker::parse("AAA"), TransactionType::Purchase, Amount::Value(1.0)),
                        ctx.fact(Ticker::parse("BBB"), TransactionType::Sale, Amount::Value(2.0)),
                    ])
                }
                "empty" => Ok(Vec::new()),
                "boom" => panic!("extractor bug"),
                _ => Err(SourceError::Shape("unreadable".into())),
            }
        }
    }

    #[tokio::test]
    async fn keeps_filing_order_and_degrades_failures() {
        let filings = vec![
            filing("slow", Some(1)),
            filing("empty", Some(2)),
            filing("boom", Some(3)),
            filing("bad", Some(4)),
        ];
        let facts = extract_filings(Arc::new(Scripted), filings, "test", 2).await;
        let tickers: Vec<_> = facts.iter().map(|f| f.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAA", "BBB", "?", "?", "?"]);
        assert!(facts[2..].iter().all(TradeFact::is_placeholder));
        assert_eq!(facts[2].subject, "Filer empty");
        assert_eq!(facts[3].subject, "Filer boom");
        assert_eq!(facts[4].source_url.as_deref(), Some("https://example.test/bad.pdf"));
    }

    #[test]
    fn most_recent_sorts_and_caps() {
        let picked = most_recent(
            vec![filing("a", Some(3)), filing("b", None), filing("c", Some(9)), filing("d", Some(5))],
            3,
        );
        let ids: Vec<_> = picked.iter().map(|f| f.document_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d", "a"]);
    }
}
