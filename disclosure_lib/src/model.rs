//! Canonical record types shared by every source.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel for any free-text field that could not be recovered.
pub const UNKNOWN: &str = "?";

/// Company/amount text used when only the existence of a filing is known.
pub const SEE_FILING: &str = "See filing";

/// A ticker symbol: 1-5 uppercase ASCII letters, or the `"?"` sentinel.
///
/// The only way to build one is [`Ticker::parse`] or [`Ticker::unknown`], so a
/// `Ticker` never holds anything else.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticker(String);

impl Ticker {
    pub fn unknown() -> Self {
        Self(UNKNOWN.to_string())
    }

    /// Normalizes raw upstream spellings (`"aapl"`, `"$AAPL"`, `"NVDA:US"`).
    /// Anything that does not reduce to 1-5 letters becomes the sentinel.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim().trim_start_matches('$');
        let symbol = trimmed.split(':').next().unwrap_or("").trim();
        if is_ticker_symbol(symbol) {
            Self(symbol.to_ascii_uppercase())
        } else {
            Self::unknown()
        }
    }

    pub fn is_known(&self) -> bool {
        self.0 != UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// True for 1-5 ASCII letters in either case.
pub fn is_ticker_symbol(s: &str) -> bool {
    (1..=5).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_alphabetic())
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Ticker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Ticker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Ticker::parse(&raw))
    }
}

/// Which side of a cluster a trade lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Purchase,
    Sale,
    Exchange,
    Unknown,
}

impl TransactionType {
    /// Maps the many spellings of a transaction code onto the four kinds.
    ///
    /// Accepts single-letter codes (`P`, `S`, `E`, with trailing annotations
    /// such as `"S (partial)"` or `"P - Purchase"`) and words
    /// (`"Purchase"`, `"Sale (Full)"`, `"buy"`, `"sell"`, `"Exchange"`).
    pub fn from_code(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        let word = lowered.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());
        if word.starts_with("purchase") || word.starts_with("buy") {
            return Self::Purchase;
        }
        if word.starts_with("sale") || word.starts_with("sell") || word.starts_with("sold") {
            return Self::Sale;
        }
        if word.starts_with("exchange") {
            return Self::Exchange;
        }
        let first = word
            .split(|c: char| !c.is_ascii_alphanumeric())
            .next()
            .unwrap_or("");
        match first {
            "p" => Self::Purchase,
            "s" => Self::Sale,
            "e" => Self::Exchange,
            _ => Self::Unknown,
        }
    }

    /// Form 4 transaction codes. Only open-market `P` and `S` are trades in the
    /// purchase/sale sense; every other letter (grants, exercises, gifts) is
    /// `Unknown`. Longer spellings go through [`TransactionType::from_code`].
    pub fn from_form4_code(raw: &str) -> Self {
        let code = raw.trim();
        if code.len() == 1 {
            return match code.to_ascii_uppercase().as_str() {
                "P" => Self::Purchase,
                "S" => Self::Sale,
                _ => Self::Unknown,
            };
        }
        Self::from_code(code)
    }

    /// Purchases are buys; every other kind is booked on the sell side so that
    /// clustering stays a partition.
    pub fn side(&self) -> Side {
        match self {
            Self::Purchase => Side::Buy,
            Self::Sale | Self::Exchange | Self::Unknown => Side::Sell,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Purchase => "Purchase",
            Self::Sale => "Sale",
            Self::Exchange => "Exchange",
            Self::Unknown => "Unknown",
        })
    }
}

/// Dollar amount of a trade in whichever form the source disclosed it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Amount {
    Value(f64),
    Range { min: f64, max: f64 },
    Display(String),
}

impl Amount {
    pub fn see_filing() -> Self {
        Self::Display(SEE_FILING.to_string())
    }

    pub fn unknown() -> Self {
        Self::Display(UNKNOWN.to_string())
    }

    /// Resolved numeric value, when the source gave one.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Range { .. } | Self::Display(_) => None,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.write_str(&format_dollars(*v)),
            Self::Range { min, max } => {
                write!(f, "{} - {}", format_dollars(*min), format_dollars(*max))
            }
            Self::Display(s) => f.write_str(s),
        }
    }
}

/// `1234567.0` -> `"$1,234,567"`, `12.5` -> `"$12.50"`.
pub fn format_dollars(v: f64) -> String {
    let cents = (v.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 { "-" } else { "" };
    if frac == 0 {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{frac:02}")
    }
}

/// The canonical normalized trade record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TradeFact {
    pub subject: String,
    pub role: String,
    pub ticker: Ticker,
    pub company: String,
    pub transaction_type: TransactionType,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub trade_date: Option<NaiveDate>,
    pub filed_date: Option<NaiveDate>,
    pub source_url: Option<String>,
    pub origin: String,
}

impl TradeFact {
    /// Stand-in for a filing whose transactions could not be extracted.
    pub fn placeholder(filing: &FilingReference, origin: &str) -> Self {
        Self {
            subject: filing.subject.clone(),
            role: filing.role.clone(),
            ticker: Ticker::unknown(),
            company: SEE_FILING.to_string(),
            transaction_type: TransactionType::Unknown,
            amount: Amount::see_filing(),
            description: None,
            trade_date: None,
            filed_date: filing.filed_date,
            source_url: Some(filing.document_url.clone()),
            origin: origin.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !self.ticker.is_known()
            && self.transaction_type == TransactionType::Unknown
            && matches!(&self.amount, Amount::Display(s) if s == SEE_FILING)
    }

    /// Identity used by the deduplicator.
    pub fn dedup_key(&self) -> (String, TransactionType, String) {
        (
            self.ticker.as_str().to_string(),
            self.transaction_type,
            self.amount.to_string(),
        )
    }
}

/// A filing discovered in an index document, before its details are read.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FilingReference {
    pub subject: String,
    pub role: String,
    pub filed_date: Option<NaiveDate>,
    pub document_id: String,
    pub document_year: Option<i32>,
    pub document_url: String,
}

/// Filing-level defaults handed to an extractor. Row-level values win.
#[derive(Clone, Debug)]
pub struct FilingContext {
    pub subject: String,
    pub role: String,
    pub company: String,
    pub filed_date: Option<NaiveDate>,
    pub source_url: Option<String>,
    pub origin: String,
}

impl FilingContext {
    pub fn for_filing(filing: &FilingReference, origin: &str) -> Self {
        Self {
            subject: filing.subject.clone(),
            role: filing.role.clone(),
            company: UNKNOWN.to_string(),
            filed_date: filing.filed_date,
            source_url: Some(filing.document_url.clone()),
            origin: origin.to_string(),
        }
    }

    /// Context for a listing page where every row names its own filer.
    pub fn listing(origin: &str, source_url: &str) -> Self {
        Self {
            subject: UNKNOWN.to_string(),
            role: UNKNOWN.to_string(),
            company: UNKNOWN.to_string(),
            filed_date: None,
            source_url: Some(source_url.to_string()),
            origin: origin.to_string(),
        }
    }

    pub fn with_company(mut self, company: &str) -> Self {
        if !company.trim().is_empty() {
            self.company = company.trim().to_string();
        }
        self
    }

    /// A fact carrying this context's defaults.
    pub fn fact(&self, ticker: Ticker, transaction_type: TransactionType, amount: Amount) -> TradeFact {
        TradeFact {
            subject: self.subject.clone(),
            role: self.role.clone(),
            ticker,
            company: self.company.clone(),
            transaction_type,
            amount,
            description: None,
            trade_date: None,
            filed_date: self.filed_date,
            source_url: self.source_url.clone(),
            origin: self.origin.clone(),
        }
    }
}

/// Trades on one ticker, split by side.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TickerCluster {
    pub ticker: Ticker,
    pub company: String,
    pub buys: Vec<TradeFact>,
    pub sells: Vec<TradeFact>,
}

impl TickerCluster {
    pub fn total(&self) -> usize {
        self.buys.len() + self.sells.len()
    }
}
