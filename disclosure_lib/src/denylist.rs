//! Parenthesized codes the stream extractor must not read as tickers.
//!
//! The built-in list is compiled in from `seed_data/ticker_denylist.yml`,
//! the same `include_str!` pattern used for other seed data. Deployments add
//! entries through configuration.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::is_ticker_symbol;

#[derive(Deserialize, Debug)]
pub struct DenylistFile {
    pub codes: Vec<DenylistEntry>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DenylistEntry {
    pub code: String,
    #[serde(default)]
    pub meaning: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Denylist {
    codes: HashSet<String>,
}

impl Denylist {
    /// Parses denylist YAML. Codes must look like tickers (that is the only
    /// way they can be confused with one) and may not repeat.
    pub fn parse(yaml_content: &str) -> Result<Self, ConfigError> {
        let file: DenylistFile = serde_yml::from_str(yaml_content)?;
        let mut codes = HashSet::new();
        for entry in file.codes {
            let code = entry.code.trim().to_ascii_uppercase();
            if !is_ticker_symbol(&code) {
                return Err(ConfigError::Invalid(format!(
                    "denylist code '{}' is not 1-5 letters",
                    entry.code
                )));
            }
            if !codes.insert(code.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate denylist code '{code}'"
                )));
            }
        }
        Ok(Self { codes })
    }

    /// The list embedded at compile time.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::parse(include_str!("../../seed_data/ticker_denylist.yml"))
    }

    /// Adds configured codes; blanks are ignored.
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for code in extra {
            let code = code.as_ref().trim().to_ascii_uppercase();
            if !code.is_empty() {
                self.codes.insert(code);
            }
        }
        self
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(&code.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
