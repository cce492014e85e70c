//! Query builder for the aggregator's `/trades` feed.

use url::Url;

/// Pagination and recency filters for the aggregator trade feed.
#[derive(Clone, Copy, Debug)]
pub struct TradeQuery {
    /// Page number (1-indexed). Defaults to 1.
    pub page: i64,
    /// Results per page. `None` uses the upstream default.
    pub page_size: Option<i64>,
    /// Filter by publication date, relative days from today (e.g. 7 = last 7 days).
    pub pub_date_relative: Option<i64>,
}

impl Default for TradeQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: None,
            pub_date_relative: None,
        }
    }
}

impl TradeQuery {
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_pub_date_relative(mut self, days: i64) -> Self {
        self.pub_date_relative = Some(days);
        self
    }

    /// Appends this query's parameters to the given URL, returning the modified URL.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("page", &self.page.to_string());
        if let Some(page_size) = self.page_size {
            url.query_pairs_mut()
                .append_pair("pageSize", &page_size.to_string());
        };
        if let Some(pub_date_relative) = self.pub_date_relative {
            url.query_pairs_mut()
                .append_pair("pubDate", format!("{}d", pub_date_relative).as_str());
        };
        url
    }
}
