use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Meta {
    #[serde(default)]
    pub paging: Paging,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page: i64,
    pub size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

/// Envelope of the aggregator's list endpoints. `meta` is optional upstream.
#[derive(Serialize, Deserialize, Debug)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub meta: Meta,
    pub data: Vec<T>,
}
