use chrono::NaiveDate;
use disclosure_lib::{
    assemble, Amount, FilingContext, FilingReference, Ticker, TradeFact, TransactionType,
};
use serde_json::Value;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("CLI crate should be inside workspace")
        .to_path_buf()
}

fn load_schema(name: &str) -> Value {
    let path = workspace_root().join("schema").join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read schema {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("schema is valid JSON")
}

fn filing() -> FilingReference {
    FilingReference {
        subject: "Jane Doe".into(),
        role: "House — CA12".into(),
        filed_date: NaiveDate::from_ymd_opt(2025, 1, 17),
        document_id: "20026590".into(),
        document_year: Some(2025),
        document_url: "https://disclosures-clerk.house.gov/public_disc/ptr-pdfs/2025/20026590.pdf"
            .into(),
    }
}

fn sample_trades() -> Vec<TradeFact> {
    let ctx = FilingContext::for_filing(&filing(), "house_clerk");
    let mut band = ctx.fact(
        Ticker::parse("WAT"),
        TransactionType::Purchase,
        Amount::Display("$1,001 - $15,000".into()),
    );
    band.trade_date = NaiveDate::from_ymd_opt(2024, 12, 8);
    band.description = Some("Waters Corporation - Common Stock".into());

    let range = ctx.fact(
        Ticker::parse("AAPL"),
        TransactionType::Sale,
        Amount::Range {
            min: 15_001.0,
            max: 50_000.0,
        },
    );
    let value = ctx.fact(
        Ticker::parse("MSFT"),
        TransactionType::Exchange,
        Amount::Value(150_250.0),
    );
    let placeholder = TradeFact::placeholder(&filing(), "house_clerk");
    vec![band, range, value, placeholder]
}

fn rendered_report(cluster: bool) -> Value {
    let report = assemble(
        "house_clerk".into(),
        sample_trades(),
        200,
        cluster.then_some(20),
    );
    serde_json::to_value(&report).expect("report serializes")
}

fn validator() -> jsonschema::Validator {
    let schema = load_schema("trade_report.schema.json");
    jsonschema::draft202012::new(&schema).expect("report schema compiles")
}

// ---------------------------------------------------------------------------
// Positive validation: rendered reports conform to the schema
// ---------------------------------------------------------------------------

#[test]
fn test_clustered_report_conforms_to_schema() {
    let report = rendered_report(true);
    assert!(report.get("clustered").is_some());

    let result = validator().validate(&report);
    if let Err(e) = &result {
        panic!("clustered report failed validation: {e}");
    }
}

#[test]
fn test_unclustered_report_conforms_to_schema() {
    let report = rendered_report(false);
    assert!(report.get("clustered").is_none());

    let result = validator().validate(&report);
    if let Err(e) = &result {
        panic!("unclustered report failed validation: {e}");
    }
}

// ---------------------------------------------------------------------------
// Negative validation: the schema catches malformed reports
// ---------------------------------------------------------------------------

#[test]
fn test_schema_rejects_lowercase_ticker() {
    let mut report = rendered_report(false);
    report["trades"][0]["ticker"] = Value::String("wat".into());
    assert!(validator().validate(&report).is_err());
}

#[test]
fn test_schema_rejects_unknown_transaction_type() {
    let mut report = rendered_report(false);
    report["trades"][0]["transaction_type"] = Value::String("Gift".into());
    assert!(validator().validate(&report).is_err());
}

#[test]
fn test_schema_rejects_missing_source() {
    let mut report = rendered_report(false);
    report.as_object_mut().unwrap().remove("source");
    assert!(validator().validate(&report).is_err());
}
