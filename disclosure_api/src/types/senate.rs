//! Report listing returned by the Senate eFD search endpoint.
//!
//! Each row is a positional array:
//! `[first name, last name, office, report link html, filed date]`.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReportListing {
    #[serde(default)]
    pub records_total: Option<i64>,
    #[serde(default)]
    pub data: Vec<Vec<String>>,
}

/// One listing row, unpacked from its positional form.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub first_name: String,
    pub last_name: String,
    pub office: String,
    pub link_html: String,
    pub filed_date: String,
}

impl ReportListing {
    /// Rows with fewer than five columns are skipped.
    pub fn rows(&self) -> Vec<ReportRow> {
        self.data
            .iter()
            .filter(|cols| cols.len() >= 5)
            .map(|cols| ReportRow {
                first_name: cols[0].trim().to_string(),
                last_name: cols[1].trim().to_string(),
                office: cols[2].trim().to_string(),
                link_html: cols[3].clone(),
                filed_date: cols[4].trim().to_string(),
            })
            .collect()
    }
}
