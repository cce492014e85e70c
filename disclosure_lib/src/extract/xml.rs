//! Loose-XML strategy for Form 4 style documents.
//!
//! Filings from different years and filer agents spell the same field with
//! different tags. Each logical [`XmlField`] has an ordered list of candidate
//! tag names in a [`SynonymTable`]; the first one carrying text wins.
//!
//! The light [`Element`] tree built here is also what the adapters use to read
//! XML indexes and Atom feeds.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::{parse_currency, Extractor};
use crate::model::{Amount, FilingContext, Ticker, TradeFact, TransactionType};
use crate::normalize::{collapse_whitespace, normalize_date};

/// One parsed element. Namespace prefixes are dropped from names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let attrs = start
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                (key, value)
            })
            .collect();
        Self {
            name,
            attrs,
            ..Self::default()
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with this name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(name))
    }

    /// Every descendant (not including `self`) in document order.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(el) = stack.pop() {
            out.push(el);
            stack.extend(el.children.iter().rev());
        }
        out
    }

    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        self.descendants().into_iter().filter(|e| e.is(name)).collect()
    }

    pub fn find(&self, name: &str) -> Option<&Element> {
        self.descendants().into_iter().find(|e| e.is(name))
    }

    /// Own text, or the text of a `<value>` child as Form 4 nests it.
    pub fn value(&self) -> Option<&str> {
        let own = self.text.trim();
        if !own.is_empty() {
            return Some(own);
        }
        self.child("value")
            .map(|v| v.text.trim())
            .filter(|v| !v.is_empty())
    }

    /// Text of the first descendant named `name` that has any.
    pub fn find_value(&self, name: &str) -> Option<&str> {
        self.descendants()
            .into_iter()
            .filter(|e| e.is(name))
            .find_map(Element::value)
    }
}

/// Parses `text` into a synthetic root whose children are the top-level
/// elements. Malformed documents yield `None`.
pub fn parse_document(text: &str) -> Option<Element> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Element::default()];
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(Element::from_start(&e)),
            Ok(Event::Empty(e)) => {
                let el = Element::from_start(&e);
                stack.last_mut()?.children.push(el);
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return None;
                }
                let done = stack.pop()?;
                stack.last_mut()?.children.push(done);
            }
            Ok(Event::Text(t)) => {
                let chunk = t
                    .unescape()
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                push_text(stack.last_mut()?, &chunk);
            }
            Ok(Event::CData(c)) => {
                let chunk = String::from_utf8_lossy(&c).into_owned();
                push_text(stack.last_mut()?, &chunk);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(
                    position = reader.error_position(),
                    error = %e,
                    "XML parse error"
                );
                return None;
            }
            Ok(_) => {}
        }
    }

    // Unclosed elements at EOF are folded into their parents.
    while stack.len() > 1 {
        let done = stack.pop()?;
        stack.last_mut()?.children.push(done);
    }
    stack.pop()
}

fn push_text(el: &mut Element, chunk: &str) {
    if !el.text.is_empty() {
        el.text.push(' ');
    }
    el.text.push_str(chunk.trim());
}

/// The XML payload of an EDGAR full-text submission (`<XML>...</XML>`), or
/// the input from its XML declaration onwards.
pub fn isolate_xml_section(text: &str) -> &str {
    if let Some(open) = text.find("<XML>") {
        let body = &text[open + "<XML>".len()..];
        let body = match body.find("</XML>") {
            Some(close) => &body[..close],
            None => body,
        };
        return body.trim();
    }
    match text.find("<?xml") {
        Some(start) => &text[start..],
        None => text,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum XmlField {
    Transaction,
    Ticker,
    Company,
    Owner,
    Role,
    Code,
    Shares,
    Price,
    Value,
    Date,
    ReportDate,
    Description,
    Direction,
}

/// Ordered tag-name candidates per logical field.
#[derive(Clone, Debug)]
pub struct SynonymTable {
    entries: HashMap<XmlField, Vec<String>>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        let defaults: [(XmlField, &[&str]); 13] = [
            (
                XmlField::Transaction,
                &["nonDerivativeTransaction", "derivativeTransaction", "transaction"],
            ),
            (
                XmlField::Ticker,
                &["issuerTradingSymbol", "tradingSymbol", "ticker", "symbol"],
            ),
            (XmlField::Company, &["issuerName", "companyName", "issuer"]),
            (
                XmlField::Owner,
                &["rptOwnerName", "reportingOwnerName", "ownerName", "name"],
            ),
            (
                XmlField::Role,
                &["officerTitle", "title", "relationship", "otherText"],
            ),
            (
                XmlField::Code,
                &["transactionCode", "code", "transactionType"],
            ),
            (
                XmlField::Shares,
                &["transactionShares", "shares", "sharesTraded", "quantity"],
            ),
            (
                XmlField::Price,
                &["transactionPricePerShare", "pricePerShare", "price"],
            ),
            (
                XmlField::Value,
                &["transactionTotalValue", "totalValue", "transactionValue"],
            ),
            (
                XmlField::Date,
                &["transactionDate", "tradeDate", "date"],
            ),
            (XmlField::ReportDate, &["periodOfReport", "reportDate"]),
            (
                XmlField::Description,
                &["securityTitle", "securityName", "description"],
            ),
            (
                XmlField::Direction,
                &["transactionAcquiredDisposedCode", "acquiredDisposedCode"],
            ),
        ];
        let entries = defaults
            .into_iter()
            .map(|(field, tags)| (field, tags.iter().map(|t| t.to_string()).collect()))
            .collect();
        Self { entries }
    }
}

impl SynonymTable {
    /// Appends a candidate tag for `field`, tried after the existing ones.
    pub fn with_synonym(mut self, field: XmlField, tag: &str) -> Self {
        let tags = self.entries.entry(field).or_default();
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag.to_string());
        }
        self
    }

    pub fn synonyms(&self, field: XmlField) -> &[String] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First non-empty value under `scope` for any synonym of `field`.
    pub fn lookup<'a>(&self, scope: &'a Element, field: XmlField) -> Option<&'a str> {
        self.synonyms(field)
            .iter()
            .find_map(|tag| scope.find_value(tag))
    }

    fn matches(&self, field: XmlField, el: &Element) -> bool {
        self.synonyms(field).iter().any(|tag| el.is(tag))
    }

    /// Outermost elements matching any synonym of `field`, document order.
    fn outermost<'a>(&self, scope: &'a Element, field: XmlField) -> Vec<&'a Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = scope.children.iter().rev().collect();
        while let Some(el) = stack.pop() {
            if self.matches(field, el) {
                out.push(el);
            } else {
                stack.extend(el.children.iter().rev());
            }
        }
        out
    }
}

#[derive(Clone, Debug, Default)]
pub struct XmlExtractor {
    synonyms: SynonymTable,
}

impl XmlExtractor {
    pub fn new(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    fn role(&self, doc: &Element) -> Option<String> {
        if let Some(role) = self.synonyms.lookup(doc, XmlField::Role) {
            return Some(collapse_whitespace(role));
        }
        let flags = [
            ("isDirector", "Director"),
            ("isOfficer", "Officer"),
            ("isTenPercentOwner", "10% Owner"),
            ("isOther", "Other"),
        ];
        let held: Vec<&str> = flags
            .iter()
            .filter(|(tag, _)| doc.find_value(tag).is_some_and(is_truthy))
            .map(|(_, label)| *label)
            .collect();
        (!held.is_empty()).then(|| held.join(", "))
    }

    fn amount(&self, tx: &Element) -> Amount {
        let shares = self
            .synonyms
            .lookup(tx, XmlField::Shares)
            .and_then(parse_currency);
        let price = self
            .synonyms
            .lookup(tx, XmlField::Price)
            .and_then(parse_currency);
        if let (Some(shares), Some(price)) = (shares, price) {
            return Amount::Value((shares * price * 100.0).round() / 100.0);
        }
        match self
            .synonyms
            .lookup(tx, XmlField::Value)
            .and_then(parse_currency)
        {
            Some(value) => Amount::Value(value),
            None => Amount::unknown(),
        }
    }

    fn transaction_type(&self, tx: &Element) -> TransactionType {
        if let Some(code) = self.synonyms.lookup(tx, XmlField::Code) {
            return TransactionType::from_form4_code(code);
        }
        match self.synonyms.lookup(tx, XmlField::Direction) {
            Some(d) if d.eq_ignore_ascii_case("A") => TransactionType::Purchase,
            Some(d) if d.eq_ignore_ascii_case("D") => TransactionType::Sale,
            _ => TransactionType::Unknown,
        }
    }
}

impl Extractor for XmlExtractor {
    fn extract(&self, text: &str, ctx: &FilingContext) -> Vec<TradeFact> {
        let Some(doc) = parse_document(isolate_xml_section(text)) else {
            return Vec::new();
        };

        let ticker = self
            .synonyms
            .lookup(&doc, XmlField::Ticker)
            .map(Ticker::parse)
            .unwrap_or_else(Ticker::unknown);
        let company = self.synonyms.lookup(&doc, XmlField::Company);
        let owner = self.synonyms.lookup(&doc, XmlField::Owner);
        let role = self.role(&doc);
        let report_date = self
            .synonyms
            .lookup(&doc, XmlField::ReportDate)
            .and_then(normalize_date);

        let mut base = ctx.clone().with_company(company.unwrap_or_default());
        if let Some(owner) = owner {
            base.subject = collapse_whitespace(owner);
        }
        if let Some(role) = role {
            base.role = role;
        }

        self.synonyms
            .outermost(&doc, XmlField::Transaction)
            .into_iter()
            .map(|tx| {
                let mut fact = base.fact(ticker.clone(), self.transaction_type(tx), self.amount(tx));
                fact.trade_date = self
                    .synonyms
                    .lookup(tx, XmlField::Date)
                    .and_then(normalize_date)
                    .or(report_date);
                fact.description = self
                    .synonyms
                    .lookup(tx, XmlField::Description)
                    .map(collapse_whitespace);
                fact
            })
            .collect()
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const FORM4: &str = r#"<SEC-DOCUMENT>0001127602-25-000001.txt : 20251209
<TYPE>4
<TEXT>
<XML>
<?xml version="1.0"?>
<ownershipDocument>
    <schemaVersion>X0508</schemaVersion>
    <documentType>4</documentType>
    <periodOfReport>2025-12-05</periodOfReport>
    <issuer>
        <issuerCik>0000320193</issuerCik>
        <issuerName>Apple Inc.</issuerName>
        <issuerTradingSymbol>AAPL</issuerTradingSymbol>
    </issuer>
    <reportingOwner>
        <reportingOwnerId>
            <rptOwnerCik>0001214156</rptOwnerCik>
            <rptOwnerName>COOK TIMOTHY D</rptOwnerName>
        </reportingOwnerId>
        <reportingOwnerRelationship>
            <isDirector>1</isDirector>
            <isOfficer>1</isOfficer>
            <officerTitle>Chief Executive Officer</officerTitle>
        </reportingOwnerRelationship>
    </reportingOwner>
    <nonDerivativeTable>
        <nonDerivativeTransaction>
            <securityTitle><value>Common Stock</value></securityTitle>
            <transactionDate><value>2025-12-03</value></transactionDate>
            <transactionCoding>
                <transactionFormType>4</transactionFormType>
                <transactionCode>S</transactionCode>
            </transactionCoding>
            <transactionAmounts>
                <transactionShares><value>1000</value></transactionShares>
                <transactionPricePerShare><value>150.25</value></transactionPricePerShare>
                <transactionAcquiredDisposedCode><value>D</value></transactionAcquiredDisposedCode>
            </transactionAmounts>
        </nonDerivativeTransaction>
        <nonDerivativeTransaction>
            <securityTitle><value>Common Stock</value></securityTitle>
            <transactionDate><value>2025-12-04</value></transactionDate>
            <transactionCoding><transactionCode>M</transactionCode></transactionCoding>
            <transactionAmounts>
                <transactionShares><value>500</value></transactionShares>
                <transactionAcquiredDisposedCode><value>A</value></transactionAcquiredDisposedCode>
            </transactionAmounts>
        </nonDerivativeTransaction>
    </nonDerivativeTable>
</ownershipDocument>
</XML>
</TEXT>
</SEC-DOCUMENT>"#;

    fn ctx() -> FilingContext {
        FilingContext::listing("sec_edgar", "https://www.sec.gov/Archives/x.txt")
    }

    #[test]
    fn reads_form4_transactions() {
        let facts = XmlExtractor::default().extract(FORM4, &ctx());
        assert_eq!(facts.len(), 2);

        let sale = &facts[0];
        assert_eq!(sale.ticker.as_str(), "AAPL");
        assert_eq!(sale.company, "Apple Inc.");
        assert_eq!(sale.subject, "COOK TIMOTHY D");
        assert_eq!(sale.role, "Chief Executive Officer");
        assert_eq!(sale.transaction_type, TransactionType::Sale);
        assert_eq!(sale.amount, Amount::Value(150_250.0));
        assert_eq!(sale.trade_date, NaiveDate::from_ymd_opt(2025, 12, 3));
        assert_eq!(sale.description.as_deref(), Some("Common Stock"));

        let exercise = &facts[1];
        assert_eq!(exercise.transaction_type, TransactionType::Unknown);
        assert_eq!(exercise.amount, Amount::unknown());
    }

    #[test]
    fn older_vocabulary_resolves_through_synonyms() {
        let xml = r#"<filing>
  <companyName>Widget Corp</companyName>
  <tradingSymbol>wdgt</tradingSymbol>
  <reportingOwnerName>Smith Anne</reportingOwnerName>
  <isTenPercentOwner>true</isTenPercentOwner>
  <transaction>
    <transactionType>Purchase</transactionType>
    <transactionTotalValue>$25,000</transactionTotalValue>
    <date>03/14/2024</date>
  </transaction>
</filing>"#;
        let facts = XmlExtractor::default().extract(xml, &ctx());
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].ticker.as_str(), "WDGT");
        assert_eq!(facts[0].company, "Widget Corp");
        assert_eq!(facts[0].subject, "Smith Anne");
        assert_eq!(facts[0].role, "10% Owner");
        assert_eq!(facts[0].transaction_type, TransactionType::Purchase);
        assert_eq!(facts[0].amount, Amount::Value(25_000.0));
        assert_eq!(facts[0].trade_date, NaiveDate::from_ymd_opt(2024, 3, 14));
    }

    #[test]
    fn added_synonym_is_tried_last() {
        let xml = "<doc><tickerSym>ZZ</tickerSym><trade><acquiredDisposedCode>D</acquiredDisposedCode></trade></doc>";
        let plain = XmlExtractor::default().extract(xml, &ctx());
        assert!(plain.is_empty());

        let table = SynonymTable::default()
            .with_synonym(XmlField::Ticker, "tickerSym")
            .with_synonym(XmlField::Transaction, "trade");
        assert_eq!(table.synonyms(XmlField::Ticker).last().map(String::as_str), Some("tickerSym"));
        let facts = XmlExtractor::new(table).extract(xml, &ctx());
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].ticker.as_str(), "ZZ");
        assert_eq!(facts[0].transaction_type, TransactionType::Sale);
    }

    #[test]
    fn missing_fields_fall_back_to_sentinels() {
        let xml = "<ownershipDocument><nonDerivativeTransaction/></ownershipDocument>";
        let facts = XmlExtractor::default().extract(xml, &ctx());
        assert_eq!(facts.len(), 1);
        assert!(!facts[0].ticker.is_known());
        assert_eq!(facts[0].transaction_type, TransactionType::Unknown);
        assert_eq!(facts[0].amount, Amount::unknown());
        assert_eq!(facts[0].company, "?");
    }

    #[test]
    fn malformed_xml_yields_nothing() {
        let facts = XmlExtractor::default().extract("<a><b></a>", &ctx());
        assert!(facts.is_empty());
        assert!(XmlExtractor::default().extract("not xml at all", &ctx()).is_empty());
    }

    #[test]
    fn element_tree_helpers() {
        let doc = parse_document(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><link rel="alternate" href="https://x/y-index.htm"/><title>4 - Doe</title></entry></feed>"#,
        )
        .unwrap();
        let entry = doc.find("entry").unwrap();
        assert_eq!(entry.child("title").and_then(Element::value), Some("4 - Doe"));
        assert_eq!(entry.child("link").and_then(|l| l.attr("href")), Some("https://x/y-index.htm"));
        assert_eq!(doc.find_all("entry").len(), 1);
    }
}
