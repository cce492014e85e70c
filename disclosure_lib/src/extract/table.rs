//! Table-row strategy for HTML listings with a stable column layout.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{parse_currency, Extractor};
use crate::model::{Amount, FilingContext, Ticker, TradeFact, TransactionType};
use crate::normalize::{normalize_date, strip_html};

static ROW_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<tr[\s>]").expect("valid row regex"));
static CELL_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<td[\s>]").expect("valid cell regex"));
static CELL_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(td|tr)\s*>").expect("valid cell end regex"));

/// How the amount column is written.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AmountCell {
    /// A number with optional `$`, sign, separators and K/M/B suffix.
    /// `in_thousands` scales the parsed value by 1,000.
    Currency { in_thousands: bool },
    /// A disclosure band such as `"$1,001 - $15,000"`, kept verbatim.
    Band,
}

/// Fixed column positions for one upstream table.
#[derive(Clone, Debug)]
pub struct TableLayout {
    pub name: &'static str,
    pub min_cells: usize,
    pub filed_date: Option<usize>,
    pub trade_date: Option<usize>,
    pub ticker: usize,
    pub company: Option<usize>,
    pub subject: Option<usize>,
    pub role: Option<usize>,
    pub transaction: usize,
    pub amount: usize,
    pub description: Option<usize>,
    pub amount_cell: AmountCell,
    /// Rows whose resolved numeric amount is below this are dropped.
    pub min_value: f64,
}

impl TableLayout {
    /// OpenInsider screener (`table.tinytable`):
    /// X, Filing Date, Trade Date, Ticker, Company, Insider, Title, Type,
    /// Price, Qty, Owned, ΔOwn, Value, ...
    pub fn openinsider() -> Self {
        Self {
            name: "openinsider",
            min_cells: 13,
            filed_date: Some(1),
            trade_date: Some(2),
            ticker: 3,
            company: Some(4),
            subject: Some(5),
            role: Some(6),
            transaction: 7,
            amount: 12,
            description: None,
            amount_cell: AmountCell::Currency { in_thousands: false },
            min_value: 0.0,
        }
    }

    /// Senate eFD PTR detail page:
    /// #, Transaction Date, Owner, Ticker, Asset Name, Asset Type, Type, Amount, Comment
    pub fn senate_ptr() -> Self {
        Self {
            name: "senate_ptr",
            min_cells: 8,
            filed_date: None,
            trade_date: Some(1),
            ticker: 3,
            company: Some(4),
            subject: None,
            role: None,
            transaction: 6,
            amount: 7,
            description: Some(4),
            amount_cell: AmountCell::Band,
            min_value: 0.0,
        }
    }

    pub fn with_min_value(mut self, min_value: f64) -> Self {
        self.min_value = min_value;
        self
    }

    pub fn with_amount_cell(mut self, amount_cell: AmountCell) -> Self {
        self.amount_cell = amount_cell;
        self
    }
}

#[derive(Clone, Debug)]
pub struct TableExtractor {
    layout: TableLayout,
}

impl TableExtractor {
    pub fn new(layout: TableLayout) -> Self {
        Self { layout }
    }

    fn row_to_fact(&self, cells: &[String], ctx: &FilingContext) -> Option<TradeFact> {
        let layout = &self.layout;
        let at = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");
        let cell = |idx: Option<usize>| idx.map(at).filter(|s| !s.is_empty());

        let amount = match layout.amount_cell {
            AmountCell::Currency { in_thousands } => match parse_currency(at(layout.amount)) {
                Some(value) => {
                    let value = if in_thousands { value * 1_000.0 } else { value };
                    if value < layout.min_value {
                        debug!(
                            layout = layout.name,
                            value, "Dropping row below minimum value"
                        );
                        return None;
                    }
                    Amount::Value(value)
                }
                None => Amount::unknown(),
            },
            AmountCell::Band => match cell(Some(layout.amount)) {
                Some(band) => Amount::Display(band.to_string()),
                None => Amount::unknown(),
            },
        };

        let mut fact = ctx.fact(
            Ticker::parse(at(layout.ticker)),
            TransactionType::from_code(at(layout.transaction)),
            amount,
        );
        if let Some(company) = cell(layout.company) {
            fact.company = company.to_string();
        }
        if let Some(subject) = cell(layout.subject) {
            fact.subject = subject.to_string();
        }
        if let Some(role) = cell(layout.role) {
            fact.role = role.to_string();
        }
        fact.description = cell(layout.description).map(str::to_string);
        fact.trade_date = cell(layout.trade_date).and_then(normalize_date);
        if let Some(filed) = cell(layout.filed_date).and_then(normalize_date) {
            fact.filed_date = Some(filed);
        }
        Some(fact)
    }
}

impl Extractor for TableExtractor {
    fn extract(&self, text: &str, ctx: &FilingContext) -> Vec<TradeFact> {
        let rows = split_rows(text);
        let has_header_cells = rows.iter().any(|r| is_header_row(r));

        let mut facts = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            if is_header_row(row) || (!has_header_cells && i == 0) {
                continue;
            }
            let cells = split_cells(row);
            if cells.len() < self.layout.min_cells {
                debug!(
                    layout = self.layout.name,
                    cells = cells.len(),
                    "Skipping short table row"
                );
                continue;
            }
            if let Some(fact) = self.row_to_fact(&cells, ctx) {
                facts.push(fact);
            }
        }
        facts
    }
}

fn is_header_row(row: &str) -> bool {
    row.to_ascii_lowercase().contains("<th")
}

/// Row fragments, each starting at its `<tr` tag.
fn split_rows(table: &str) -> Vec<&str> {
    let starts: Vec<usize> = ROW_START.find_iter(table).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(table.len());
            &table[start..end]
        })
        .collect()
}

/// Markup-free cell texts of one row, closing tags optional.
fn split_cells(row: &str) -> Vec<String> {
    let starts: Vec<_> = CELL_START.find_iter(row).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let next = starts.get(i + 1).map(|n| n.start()).unwrap_or(row.len());
            let open_end = if m.as_str().ends_with('>') {
                m.end()
            } else {
                row[m.end()..next]
                    .find('>')
                    .map(|p| m.end() + p + 1)
                    .unwrap_or(next)
            };
            let body = &row[open_end..next];
            let body = match CELL_END.find(body) {
                Some(end) => &body[..end.start()],
                None => body,
            };
            strip_html(body)
        })
        .collect()
}
