//! Document-to-record extraction.
//!
//! Three strategies share the [`Extractor`] contract:
//! - [`TableExtractor`] reads HTML table rows by fixed column position.
//! - [`StreamExtractor`] scans flattened PDF text with a two-tier grammar.
//! - [`XmlExtractor`] reads loosely-tagged XML through tag-name synonyms.
//!
//! Extraction never fails. Malformed input produces an empty batch.

pub mod stream;
pub mod table;
pub mod xml;

pub use stream::StreamExtractor;
pub use table::{AmountCell, TableExtractor, TableLayout};
pub use xml::{SynonymTable, XmlExtractor, XmlField};

use crate::dedup::dedup;
use crate::model::{FilingContext, TradeFact};

pub trait Extractor {
    /// Facts found in `text`, in document order. Fields the text does not
    /// carry are filled from `ctx`.
    fn extract(&self, text: &str, ctx: &FilingContext) -> Vec<TradeFact>;

    /// [`Extractor::extract`] followed by deduplication, for one filing or one
    /// listing page.
    fn extract_batch(&self, text: &str, ctx: &FilingContext) -> Vec<TradeFact> {
        dedup(self.extract(text, ctx))
    }
}

/// Parses a currency cell such as `"+$1,234,567"`, `"-$75K"` or `"2.5M"`.
///
/// Signs are dropped: the transaction code already says which way money moved.
pub(crate) fn parse_currency(raw: &str) -> Option<f64> {
    let mut cleaned = raw.trim().replace([',', ' '], "");
    if cleaned.is_empty() || cleaned == "-" || cleaned == "—" {
        return None;
    }
    cleaned = cleaned
        .trim_start_matches(['+', '-'])
        .trim_start_matches('$')
        .to_string();
    let (num_str, mult) = match cleaned.chars().last()? {
        'K' | 'k' => (&cleaned[..cleaned.len() - 1], 1_000.0),
        'M' | 'm' => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        'B' | 'b' => (&cleaned[..cleaned.len() - 1], 1_000_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };
    let num: f64 = num_str.parse().ok()?;
    num.is_finite().then(|| num * mult)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_currency_variants() {
        assert_eq!(parse_currency("$1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_currency("+$12,500"), Some(12_500.0));
        assert_eq!(parse_currency("-$75K"), Some(75_000.0));
        assert_eq!(parse_currency("2.5M"), Some(2_500_000.0));
        assert_eq!(parse_currency("$1B"), Some(1_000_000_000.0));
        assert_eq!(parse_currency("—"), None);
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("n/a"), None);
    }
}
