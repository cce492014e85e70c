//! Result assembly: run an endpoint's chain, order, trim and cluster.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use disclosure_api::{Client, ClientOptions};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chain::{AdapterChain, RequestContext};
use crate::cluster::cluster;
use crate::config::ServiceConfig;
use crate::denylist::Denylist;
use crate::error::{ChainError, ServiceError};
use crate::model::{TickerCluster, TradeFact};
use crate::sources::build_chain;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Congress,
    Insider,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Congress => "congress",
            Self::Insider => "insider",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "congress" => Ok(Self::Congress),
            "insider" => Ok(Self::Insider),
            other => Err(format!("unknown endpoint '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ReportOptions {
    /// Record limit; `None` uses the configured default.
    pub limit: Option<usize>,
    pub cluster: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            limit: None,
            cluster: true,
        }
    }
}

/// The JSON body of a successful report.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TradeReport {
    pub success: bool,
    pub count: usize,
    pub source: String,
    pub trades: Vec<TradeFact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustered: Option<Vec<TickerCluster>>,
}

pub struct TradeService {
    congress: AdapterChain,
    insider: AdapterChain,
    max_results: usize,
    max_clusters: usize,
    budget: Duration,
}

impl TradeService {
    pub fn new(
        congress: AdapterChain,
        insider: AdapterChain,
        max_results: usize,
        max_clusters: usize,
    ) -> Self {
        Self {
            congress,
            insider,
            max_results,
            max_clusters,
            budget: ServiceConfig::default().request_budget(),
        }
    }

    /// Deadline for one report across the whole chain.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Builds the fetcher and both chains from configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let client = Client::new(&ClientOptions {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
        })?;
        let denylist = Denylist::builtin()?;
        let congress = build_chain(
            Endpoint::Congress.as_str(),
            &config.congress_order,
            &client,
            config,
            &denylist,
        )?;
        let insider = build_chain(
            Endpoint::Insider.as_str(),
            &config.insider_order,
            &client,
            config,
            &denylist,
        )?;
        Ok(Self::new(
            congress,
            insider,
            config.max_results,
            config.max_clusters,
        )
        .with_budget(config.request_budget()))
    }

    pub fn chain(&self, endpoint: Endpoint) -> &AdapterChain {
        match endpoint {
            Endpoint::Congress => &self.congress,
            Endpoint::Insider => &self.insider,
        }
    }

    pub async fn report(
        &self,
        endpoint: Endpoint,
        options: ReportOptions,
        ctx: &RequestContext,
    ) -> Result<TradeReport, ServiceError> {
        let chain = self.chain(endpoint);
        let outcome = match tokio::time::timeout(self.budget, chain.run(ctx)).await {
            Ok(outcome) => outcome?,
            Err(_) => {
                warn!(
                    endpoint = chain.endpoint(),
                    budget = ?self.budget,
                    "Report deadline passed before any source answered"
                );
                return Err(ChainError::TimedOut {
                    budget: self.budget,
                    attempted: chain.source_names().into_iter().map(String::from).collect(),
                }
                .into());
            }
        };
        let limit = options
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(self.max_results);
        let max_clusters = options.cluster.then_some(self.max_clusters);
        let report = assemble(outcome.source, outcome.trades, limit, max_clusters);
        info!(
            endpoint = %endpoint,
            source = %report.source,
            count = report.count,
            "Assembled report"
        );
        Ok(report)
    }
}

/// Newest first by filing date, then trade date; undated records last.
/// The sort is stable, so equal dates keep chain order.
pub fn sort_by_recency(trades: &mut [TradeFact]) {
    trades.sort_by(|a, b| {
        b.filed_date
            .cmp(&a.filed_date)
            .then_with(|| b.trade_date.cmp(&a.trade_date))
    });
}

/// Orders, trims and optionally clusters a committed batch.
pub fn assemble(
    source: String,
    mut trades: Vec<TradeFact>,
    limit: usize,
    max_clusters: Option<usize>,
) -> TradeReport {
    sort_by_recency(&mut trades);
    trades.truncate(limit);
    let clustered = max_clusters
        .map(|max| cluster(&trades, max))
        .filter(|c| !c.is_empty());
    TradeReport {
        success: true,
        count: trades.len(),
        source,
        trades,
        clustered,
    }
}
