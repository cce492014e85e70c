//! Priority-ordered fallback across source adapters.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{ChainError, SourceError};
use crate::model::TradeFact;

/// Request-scoped inputs an adapter may need.
#[derive(Clone, Copy, Debug)]
pub struct RequestContext {
    pub today: NaiveDate,
}

impl RequestContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn now() -> Self {
        Self::new(chrono::Utc::now().date_naive())
    }
}

/// Binds one upstream origin to the common extraction contract.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// A batch of facts, possibly empty. Errors are recovered by the chain.
    async fn fetch_trades(&self, ctx: &RequestContext) -> Result<Vec<TradeFact>, SourceError>;
}

/// What happened when the chain asked one adapter.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptOutcome {
    Committed(usize),
    Empty,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attempt {
    pub source: String,
    pub outcome: AttemptOutcome,
}

/// The batch the chain committed to, with the trail that led there.
#[derive(Debug)]
pub struct ChainOutcome {
    pub source: String,
    pub trades: Vec<TradeFact>,
    pub attempts: Vec<Attempt>,
}

pub struct AdapterChain {
    endpoint: String,
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl AdapterChain {
    pub fn new(endpoint: impl Into<String>, adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self {
            endpoint: endpoint.into(),
            adapters,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Asks each adapter in priority order and commits to the first
    /// non-empty batch. Lower-priority adapters are not invoked after that.
    pub async fn run(&self, ctx: &RequestContext) -> Result<ChainOutcome, ChainError> {
        let mut attempts = Vec::with_capacity(self.adapters.len());

        for adapter in &self.adapters {
            let source = adapter.name().to_string();
            match adapter.fetch_trades(ctx).await {
                Ok(trades) if !trades.is_empty() => {
                    info!(
                        endpoint = %self.endpoint,
                        source = %source,
                        count = trades.len(),
                        "Committed to source"
                    );
                    attempts.push(Attempt {
                        source: source.clone(),
                        outcome: AttemptOutcome::Committed(trades.len()),
                    });
                    return Ok(ChainOutcome {
                        source,
                        trades,
                        attempts,
                    });
                }
                Ok(_) => {
                    warn!(endpoint = %self.endpoint, source = %source, "Source returned no trades");
                    attempts.push(Attempt {
                        source,
                        outcome: AttemptOutcome::Empty,
                    });
                }
                Err(e) => {
                    warn!(endpoint = %self.endpoint, source = %source, error = %e, "Source failed");
                    attempts.push(Attempt {
                        source,
                        outcome: AttemptOutcome::Failed(e.to_string()),
                    });
                }
            }
        }

        Err(ChainError::Exhausted {
            attempted: attempts.into_iter().map(|a| a.source).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, FilingContext, Ticker, TransactionType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fake {
        name: &'static str,
        count: usize,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Fake {
        fn new(name: &'static str, count: usize) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let fake = Self {
                name,
                count,
                fail: false,
                calls: Arc::clone(&calls),
            };
            (fake, calls)
        }

        fn failing(name: &'static str) -> Self {
            Self {
                name,
                count: 0,
                fail: true,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for Fake {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_trades(&self, _ctx: &RequestContext) -> Result<Vec<TradeFact>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Shape("missing table".into()));
            }
            let ctx = FilingContext::listing(self.name, "https://example.test");
            Ok((0..self.count)
                .map(|i| {
                    ctx.fact(
                        Ticker::parse("ACME"),
                        TransactionType::Purchase,
                        Amount::Value(i as f64),
                    )
                })
                .collect())
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
    }

    #[tokio::test]
    async fn commits_to_first_non_empty_source() {
        let (first, first_calls) = Fake::new("first", 0);
        let (second, second_calls) = Fake::new("second", 5);
        let (third, third_calls) = Fake::new("third", 10);
        let chain = AdapterChain::new(
            "congress",
            vec![Box::new(first), Box::new(second), Box::new(third)],
        );

        let outcome = chain.run(&ctx()).await.unwrap();
        assert_eq!(outcome.source, "second");
        assert_eq!(outcome.trades.len(), 5);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            outcome.attempts,
            vec![
                Attempt {
                    source: "first".into(),
                    outcome: AttemptOutcome::Empty
                },
                Attempt {
                    source: "second".into(),
                    outcome: AttemptOutcome::Committed(5)
                },
            ]
        );
    }

    #[tokio::test]
    async fn failures_fall_through() {
        let (second, _) = Fake::new("second", 2);
        let chain = AdapterChain::new(
            "insider",
            vec![Box::new(Fake::failing("first")), Box::new(second)],
        );
        let outcome = chain.run(&ctx()).await.unwrap();
        assert_eq!(outcome.source, "second");
        assert!(matches!(outcome.attempts[0].outcome, AttemptOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn exhaustion_names_every_source() {
        let (empty, _) = Fake::new("b", 0);
        let chain = AdapterChain::new(
            "congress",
            vec![Box::new(Fake::failing("a")), Box::new(empty)],
        );
        let err = chain.run(&ctx()).await.unwrap_err();
        assert_eq!(err.to_string(), "all sources failed: a, b");
        match err {
            ChainError::Exhausted { attempted } => assert_eq!(attempted, vec!["a", "b"]),
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_chain_is_exhausted() {
        let chain = AdapterChain::new("congress", Vec::new());
        assert!(chain.run(&ctx()).await.is_err());
        assert!(chain.source_names().is_empty());
    }
}
