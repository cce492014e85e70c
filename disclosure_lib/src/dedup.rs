//! Exact-duplicate removal within one extraction batch.

use std::collections::HashSet;

use crate::model::TradeFact;

/// Drops facts whose `(ticker, transaction_type, amount)` triple was already
/// seen, keeping the first occurrence in place.
pub fn dedup(facts: Vec<TradeFact>) -> Vec<TradeFact> {
    let mut seen = HashSet::with_capacity(facts.len());
    facts
        .into_iter()
        .filter(|fact| seen.insert(fact.dedup_key()))
        .collect()
}
