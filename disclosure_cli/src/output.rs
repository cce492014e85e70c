use disclosure_lib::{TickerCluster, TradeFact, TradeReport};
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled)]
struct TradeRow {
    #[tabled(rename = "Filed")]
    filed: String,
    #[tabled(rename = "Traded")]
    traded: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Type")]
    tx_type: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Buys")]
    buys: usize,
    #[tabled(rename = "Sells")]
    sells: usize,
}

// -- Row builders --

fn build_trade_rows(trades: &[TradeFact]) -> Vec<TradeRow> {
    trades
        .iter()
        .map(|t| TradeRow {
            filed: format_date(t.filed_date),
            traded: format_date(t.trade_date),
            subject: t.subject.clone(),
            role: t.role.clone(),
            ticker: t.ticker.to_string(),
            company: truncate(&t.company, 40),
            tx_type: t.transaction_type.to_string(),
            amount: t.amount.to_string(),
        })
        .collect()
}

fn build_cluster_rows(clusters: &[TickerCluster]) -> Vec<ClusterRow> {
    clusters
        .iter()
        .map(|c| ClusterRow {
            ticker: c.ticker.to_string(),
            company: truncate(&c.company, 40),
            buys: c.buys.len(),
            sells: c.sells.len(),
        })
        .collect()
}

// -- Table output --

pub fn print_report_table(report: &TradeReport) {
    println!("{} trades from {}", report.count, report.source);
    println!("{}", Table::new(build_trade_rows(&report.trades)));
    if let Some(clusters) = &report.clustered {
        println!("{}", Table::new(build_cluster_rows(clusters)));
    }
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use disclosure_lib::{assemble, Amount, FilingContext, Ticker, TransactionType};

    fn report() -> TradeReport {
        let ctx = FilingContext::listing("house_clerk", "https://example.test");
        let mut buy = ctx
            .clone()
            .with_company("Waters Corporation")
            .fact(Ticker::parse("WAT"), TransactionType::Purchase, Amount::Display("$1,001 - $15,000".into()));
        buy.filed_date = NaiveDate::from_ymd_opt(2026, 1, 1);
        let sell = ctx.fact(Ticker::parse("WAT"), TransactionType::Sale, Amount::Value(2_500.0));
        assemble("house_clerk".into(), vec![buy, sell], 10, Some(5))
    }

    #[test]
    fn trade_rows_render_every_field() {
        let rows = build_trade_rows(&report().trades);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].filed, "2026-01-01");
        assert_eq!(rows[0].traded, "-");
        assert_eq!(rows[0].ticker, "WAT");
        assert_eq!(rows[0].company, "Waters Corporation");
        assert_eq!(rows[0].tx_type, "Purchase");
        assert_eq!(rows[0].amount, "$1,001 - $15,000");
        assert_eq!(rows[1].amount, "$2,500");
    }

    #[test]
    fn cluster_rows_count_sides() {
        let report = report();
        let rows = build_cluster_rows(report.clustered.as_deref().unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].company, "Waters Corporation");
        assert_eq!((rows[0].buys, rows[0].sells), (1, 1));
    }

    #[test]
    fn table_contains_headers() {
        let table = Table::new(build_trade_rows(&report().trades)).to_string();
        assert!(table.contains("Ticker"));
        assert!(table.contains("WAT"));
    }

    #[test]
    fn truncate_long_company_names() {
        assert_eq!(truncate("Apple Inc.", 40), "Apple Inc.");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
