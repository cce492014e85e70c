//! Text normalization shared by every extraction strategy.
//!
//! Two paths: [`strip_html`] for scraped markup and [`flatten_pdf_text`] for
//! text pulled out of PDF content streams. Neither can fail.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static BREAK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid break regex"));
/// A tag, allowing `>` inside quoted attribute values.
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("valid tag regex")
});
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"));
static ANY_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Removes tags and decodes the handful of entities seen in scraped pages.
///
/// `&amp;` is decoded last so that `&amp;lt;` yields the literal `&lt;`.
pub fn strip_html(raw: &str) -> String {
    let text = BREAK_TAG.replace_all(raw, " ");
    let text = ANY_TAG.replace_all(&text, "");
    text.replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Flattens PDF-extracted text into one line.
///
/// Only existing whitespace is touched: `"P12/08/2025"` stays glued together.
pub fn flatten_pdf_text(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n").replace('\n', " ");
    WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
}

/// Collapses all whitespace runs (including single newlines and tabs) to one space.
pub fn collapse_whitespace(raw: &str) -> String {
    ANY_WHITESPACE.replace_all(raw, " ").trim().to_string()
}

/// Returns the first `<table ...>...</table>` whose opening tag mentions `marker`.
///
/// Nested tables are balanced, so the fragment always ends at the matching
/// close tag. Returns `None` when no such table exists or it is never closed.
pub fn isolate_table<'a>(html: &'a str, marker: &str) -> Option<&'a str> {
    let lower = html.to_ascii_lowercase();
    let marker = marker.to_ascii_lowercase();

    let mut search_from = 0;
    let start = loop {
        let pos = search_from + lower[search_from..].find("<table")?;
        let tag_end = pos + lower[pos..].find('>')?;
        if lower[pos..tag_end].contains(&marker) {
            break pos;
        }
        search_from = tag_end;
    };

    let mut depth = 0usize;
    let mut cursor = start;
    loop {
        let next_open = lower[cursor..].find("<table").map(|p| p + cursor);
        let next_close = lower[cursor..].find("</table").map(|p| p + cursor)?;
        match next_open {
            Some(open) if open < next_close => {
                depth += 1;
                cursor = open + "<table".len();
            }
            _ => {
                depth = depth.saturating_sub(1);
                let close_end = next_close + lower[next_close..].find('>')? + 1;
                if depth == 0 {
                    return Some(&html[start..close_end]);
                }
                cursor = close_end;
            }
        }
    }
}

/// Parses the date spellings seen across sources into a calendar date.
///
/// Accepts `MM/DD/YYYY` (with or without zero padding), `YYYY-MM-DD`,
/// ISO date-times (the date part is used) and `Mon DD, YYYY`.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if s.len() > 10 && s.is_char_boundary(10) {
        if let Ok(d) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
            return Some(d);
        }
    }
    NaiveDate::parse_from_str(s, "%b %d, %Y").ok()
}
