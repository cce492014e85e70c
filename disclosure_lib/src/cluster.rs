//! Per-ticker buy/sell grouping for ranked display.

use std::collections::HashMap;

use crate::model::{Side, TickerCluster, TradeFact, UNKNOWN, SEE_FILING};

/// Groups facts with a known ticker into clusters, most active first.
///
/// Facts keep their encounter order inside `buys`/`sells`; clusters with the
/// same size keep the order in which their ticker first appeared.
pub fn cluster(facts: &[TradeFact], max_clusters: usize) -> Vec<TickerCluster> {
    let mut clusters: Vec<TickerCluster> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for fact in facts.iter().filter(|f| f.ticker.is_known()) {
        let slot = *index.entry(fact.ticker.as_str()).or_insert_with(|| {
            clusters.push(TickerCluster {
                ticker: fact.ticker.clone(),
                company: UNKNOWN.to_string(),
                buys: Vec::new(),
                sells: Vec::new(),
            });
            clusters.len() - 1
        });
        let entry = &mut clusters[slot];
        if entry.company == UNKNOWN && is_known_company(&fact.company) {
            entry.company = fact.company.clone();
        }
        match fact.transaction_type.side() {
            Side::Buy => entry.buys.push(fact.clone()),
            Side::Sell => entry.sells.push(fact.clone()),
        }
    }

    clusters.sort_by(|a, b| b.total().cmp(&a.total()));
    clusters.truncate(max_clusters);
    clusters
}

fn is_known_company(company: &str) -> bool {
    let c = company.trim();
    !c.is_empty() && c != UNKNOWN && c != SEE_FILING
}
