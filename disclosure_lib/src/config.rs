//! Service configuration, loaded from TOML with env var overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_USER_AGENT: &str = "DISCLOSURE_FEED_USER_AGENT";
pub const ENV_TIMEOUT_SECS: &str = "DISCLOSURE_FEED_TIMEOUT_SECS";

/// Upstream locations. Only the roots are configurable; paths are fixed per
/// adapter.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SourceUrls {
    pub capitol_trades: String,
    pub house_clerk: String,
    pub senate_efd: String,
    /// Path of the Senate report search endpoint under `senate_efd`.
    pub senate_report_path: String,
    pub sec_edgar: String,
    pub openinsider: String,
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self {
            capitol_trades: "https://bff.capitoltrades.com".into(),
            house_clerk: "https://disclosures-clerk.house.gov".into(),
            senate_efd: "https://efdsearch.senate.gov".into(),
            senate_report_path: "/search/report/data/".into(),
            sec_edgar: "https://www.sec.gov".into(),
            openinsider: "http://openinsider.com".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Sent on every upstream request. SEC asks for contact details here.
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
    /// Deadline for one whole report, across every source of the chain.
    pub request_budget_secs: u64,
    /// Filings processed per adapter run, most recent first.
    pub max_filings: usize,
    /// Concurrent detail fetches per adapter run.
    pub concurrency: usize,
    /// Default record limit of a report.
    pub max_results: usize,
    pub max_clusters: usize,
    /// Insider screener rows below this dollar value are dropped.
    pub min_value: f64,
    /// Loose stream grammar window, in bytes.
    pub lookahead: usize,
    /// Codes added to the built-in ticker denylist.
    pub denylist_extra: Vec<String>,
    /// HTTP response cache lifetime; 0 disables it.
    pub cache_ttl_secs: u64,
    /// Recency filter for the aggregator feed, in days.
    pub capitol_trades_days: i64,
    /// Year of the House index to read; defaults to the current year.
    pub house_year: Option<i32>,
    pub congress_order: Vec<String>,
    pub insider_order: Vec<String>,
    pub sources: SourceUrls,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: 15,
            request_budget_secs: 60,
            max_filings: 40,
            concurrency: 8,
            max_results: 200,
            max_clusters: 20,
            min_value: 10_000.0,
            lookahead: 400,
            denylist_extra: Vec::new(),
            cache_ttl_secs: 300,
            capitol_trades_days: 30,
            house_year: None,
            congress_order: vec![
                "capitol_trades".into(),
                "house_clerk".into(),
                "senate_efd".into(),
            ],
            insider_order: vec!["sec_edgar".into(), "openinsider".into()],
            sources: SourceUrls::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `DISCLOSURE_FEED_USER_AGENT` / `DISCLOSURE_FEED_TIMEOUT_SECS`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ua) = std::env::var(ENV_USER_AGENT)
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            self.user_agent = Some(ua);
        }
        self.timeout_secs = env_u64(ENV_TIMEOUT_SECS, self.timeout_secs);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_budget(&self) -> Duration {
        Duration::from_secs(self.request_budget_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        if self.request_budget_secs == 0 {
            return Err(ConfigError::Invalid("request_budget_secs must be positive".into()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be positive".into()));
        }
        if self.congress_order.is_empty() || self.insider_order.is_empty() {
            return Err(ConfigError::Invalid(
                "congress_order and insider_order need at least one source".into(),
            ));
        }
        Ok(())
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.request_budget(), Duration::from_secs(60));
        assert_eq!(config.congress_order[0], "capitol_trades");
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = ServiceConfig::from_toml_str(
            r#"
max_filings = 5
denylist_extra = ["TR"]
insider_order = ["openinsider"]

[sources]
openinsider = "http://127.0.0.1:9999"
"#,
        )
        .unwrap();
        assert_eq!(config.max_filings, 5);
        assert_eq!(config.denylist_extra, vec!["TR"]);
        assert_eq!(config.insider_order, vec!["openinsider"]);
        assert_eq!(config.sources.openinsider, "http://127.0.0.1:9999");
        assert_eq!(config.sources.sec_edgar, "https://www.sec.gov");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ServiceConfig::from_toml_str("concurrency = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ServiceConfig::from_toml_str("request_budget_secs = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ServiceConfig::from_toml_str("congress_order = []"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ServiceConfig::from_toml_str("timeout_secs = \"soon\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ServiceConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
