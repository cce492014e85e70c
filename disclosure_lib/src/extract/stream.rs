//! Flattened-stream strategy for PTR text pulled out of PDFs.
//!
//! The text has no column delimiters. Rows look like
//!
//! ```text
//! SP Waters Corporation - Common Stock (WAT) [ST] P 12/08/2025 01/01/2026 $1,001 - $15,000
//! ```
//!
//! A single left-to-right scan tracks the most recent ticker marker and binds
//! every transaction it meets to it. When that tight grammar finds nothing,
//! a looser grammar searches a bounded window after each marker.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use super::Extractor;
use crate::denylist::Denylist;
use crate::model::{Amount, FilingContext, Ticker, TradeFact, TransactionType, UNKNOWN};
use crate::normalize::{collapse_whitespace, normalize_date};

const AMOUNT: &str =
    r"(?:\$[\d,]+(?:\.\d{2})?(?:\s*-\s*\$[\d,]+(?:\.\d{2})?)?|Over\s*\$[\d,]+(?:\.\d{2})?)";
const DATE: &str = r"\d{1,2}/\d{1,2}/\d{4}";

/// Marker or tight transaction, whichever comes first.
static TIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\((?P<marker>[A-Z]{{1,5}})\)|\b(?P<code>[PSE])(?:\s*\(partial\))?\s*(?P<traded>{DATE})\s*(?P<notified>{DATE})\s*(?P<amount>{AMOUNT})"
    ))
    .expect("valid tight grammar")
});
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((?P<marker>[A-Z]{1,5})\)").expect("valid marker regex"));
static LOOSE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<code>[PSE])\b(?:\s*\(partial\))?").expect("valid loose code regex")
});
static LOOSE_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(AMOUNT).expect("valid amount regex"));
static LOOSE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DATE).expect("valid date regex"));
static BARE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,5}\b").expect("valid owner code regex"));

const DEFAULT_LOOKAHEAD: usize = 400;
const DESCRIPTION_MAX: usize = 120;

#[derive(Clone, Debug)]
pub struct StreamExtractor {
    denylist: Denylist,
    lookahead: usize,
}

struct Marker {
    ticker: Ticker,
    description: Option<String>,
}

impl StreamExtractor {
    pub fn new(denylist: Denylist) -> Self {
        Self {
            denylist,
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }

    /// Window size in bytes for the loose grammar.
    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead.max(1);
        self
    }

    fn tight_pass(&self, text: &str, ctx: &FilingContext) -> Vec<TradeFact> {
        let mut facts = Vec::new();
        let mut current: Option<Marker> = None;
        let mut boundary = 0;

        for caps in TIGHT.captures_iter(text) {
            let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or_default();
            if let Some(marker) = caps.name("marker") {
                if self.denylist.contains(marker.as_str()) {
                    debug!(code = marker.as_str(), "Skipping denylisted marker");
                } else {
                    current = Some(Marker {
                        ticker: Ticker::parse(marker.as_str()),
                        description: self.description_before(text, boundary, whole.0),
                    });
                }
                boundary = whole.1;
                continue;
            }

            match &current {
                Some(marker) => facts.push(build_fact(ctx, marker, &caps)),
                None => debug!(
                    code = caps.name("code").map(|m| m.as_str()).unwrap_or_default(),
                    "Transaction before any ticker marker"
                ),
            }
            boundary = whole.1;
        }
        facts
    }

    fn loose_pass(&self, text: &str, ctx: &FilingContext) -> Vec<TradeFact> {
        let mut facts = Vec::new();
        let mut boundary = 0;

        for caps in MARKER.captures_iter(text) {
            let (Some(whole), Some(symbol)) = (caps.get(0), caps.name("marker")) else {
                continue;
            };
            let prior = boundary;
            boundary = whole.end();
            if self.denylist.contains(symbol.as_str()) {
                continue;
            }

            let window = window_after(text, whole.end(), self.lookahead);
            let Some(code) = LOOSE_CODE.captures(window) else {
                continue;
            };
            let code_end = code.get(0).map(|m| m.end()).unwrap_or_default();
            let rest = &window[code_end..];
            let Some(amount) = LOOSE_AMOUNT.find(rest) else {
                continue;
            };

            let mut fact = ctx.fact(
                Ticker::parse(symbol.as_str()),
                TransactionType::from_code(&code["code"]),
                Amount::Display(collapse_whitespace(amount.as_str())),
            );
            fact.trade_date = LOOSE_DATE
                .find(&rest[..amount.start()])
                .and_then(|d| normalize_date(d.as_str()));
            let description = self.description_before(text, prior, whole.start());
            apply_description(&mut fact, description);
            facts.push(fact);
        }
        facts
    }

    /// Best-effort asset text between the previous match and a ticker marker.
    ///
    /// Header text up to the last `?` and everything up to the last bare
    /// owner code (`SP Waters Corp`) are dropped.
    fn description_before(&self, text: &str, from: usize, to: usize) -> Option<String> {
        let mut segment = text.get(from..to)?;
        if let Some(q) = segment.rfind('?') {
            segment = &segment[q + 1..];
        }
        if let Some(code) = BARE_CODE
            .find_iter(segment)
            .filter(|m| self.denylist.contains(m.as_str()))
            .last()
        {
            segment = &segment[code.end()..];
        }
        let segment = segment.trim();
        if segment.is_empty() {
            return None;
        }
        let mut start = segment.len().saturating_sub(DESCRIPTION_MAX);
        while !segment.is_char_boundary(start) {
            start += 1;
        }
        let mut tail = &segment[start..];
        if start > 0 {
            if let Some(space) = tail.find(' ') {
                tail = &tail[space + 1..];
            }
        }
        let tail = tail.trim().trim_end_matches(['-', ' ']).trim();
        (!tail.is_empty()).then(|| tail.to_string())
    }
}

impl Extractor for StreamExtractor {
    fn extract(&self, text: &str, ctx: &FilingContext) -> Vec<TradeFact> {
        let tight = self.tight_pass(text, ctx);
        if !tight.is_empty() {
            return tight;
        }
        let loose = self.loose_pass(text, ctx);
        if !loose.is_empty() {
            debug!(count = loose.len(), "Loose grammar recovered transactions");
        }
        loose
    }
}

fn build_fact(ctx: &FilingContext, marker: &Marker, caps: &Captures<'_>) -> TradeFact {
    let mut fact = ctx.fact(
        marker.ticker.clone(),
        TransactionType::from_code(&caps["code"]),
        Amount::Display(collapse_whitespace(&caps["amount"])),
    );
    fact.trade_date = normalize_date(&caps["traded"]);
    apply_description(&mut fact, marker.description.clone());
    fact
}

fn apply_description(fact: &mut TradeFact, description: Option<String>) {
    if let Some(desc) = description {
        if fact.company == UNKNOWN {
            fact.company = desc.clone();
        }
        fact.description = Some(desc);
    }
}

fn window_after(text: &str, from: usize, len: usize) -> &str {
    let mut end = from.saturating_add(len).min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[from..end]
}
