//! Concrete source adapters and the registry that builds chains from names.

pub mod batch;
pub mod capitol_trades;
pub mod house_clerk;
pub mod openinsider;
pub mod sec_edgar;
pub mod senate_efd;

pub use batch::{extract_filings, most_recent, FilingDetail};
pub use capitol_trades::CapitolTradesAdapter;
pub use house_clerk::HouseClerkAdapter;
pub use openinsider::OpenInsiderAdapter;
pub use sec_edgar::SecEdgarAdapter;
pub use senate_efd::SenateEfdAdapter;

use disclosure_api::Client;
use tracing::warn;

use crate::chain::{AdapterChain, SourceAdapter};
use crate::config::ServiceConfig;
use crate::denylist::Denylist;
use crate::error::{ConfigError, SourceError};

pub const CAPITOL_TRADES: &str = "capitol_trades";
pub const HOUSE_CLERK: &str = "house_clerk";
pub const SENATE_EFD: &str = "senate_efd";
pub const SEC_EDGAR: &str = "sec_edgar";
pub const OPENINSIDER: &str = "openinsider";

pub const ALL_SOURCES: [&str; 5] = [CAPITOL_TRADES, HOUSE_CLERK, SENATE_EFD, SEC_EDGAR, OPENINSIDER];

/// Builds the adapter registered under `name`.
pub fn build_adapter(
    name: &str,
    client: &Client,
    config: &ServiceConfig,
    denylist: &Denylist,
) -> Result<Box<dyn SourceAdapter>, ConfigError> {
    let urls = &config.sources;
    let adapter: Box<dyn SourceAdapter> = match name {
        CAPITOL_TRADES => Box::new(CapitolTradesAdapter::new(
            client.clone(),
            &urls.capitol_trades,
            config.max_results,
            config.capitol_trades_days,
        )),
        HOUSE_CLERK => Box::new(
            HouseClerkAdapter::new(client.clone(), &urls.house_clerk, denylist.clone(), config)
                .with_year(config.house_year),
        ),
        SENATE_EFD => Box::new(SenateEfdAdapter::new(
            client.clone(),
            &urls.senate_efd,
            &urls.senate_report_path,
            config,
        )),
        SEC_EDGAR => Box::new(SecEdgarAdapter::new(client.clone(), &urls.sec_edgar, config)),
        OPENINSIDER => Box::new(OpenInsiderAdapter::new(
            client.clone(),
            &urls.openinsider,
            config.max_results,
            config.min_value,
        )),
        other => return Err(ConfigError::UnknownSource(other.to_string())),
    };
    Ok(adapter)
}

/// Builds a chain for `endpoint` from adapter names in priority order.
pub fn build_chain(
    endpoint: &str,
    order: &[String],
    client: &Client,
    config: &ServiceConfig,
    denylist: &Denylist,
) -> Result<AdapterChain, ConfigError> {
    let adapters = order
        .iter()
        .map(|name| build_adapter(name.trim(), client, config, denylist))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AdapterChain::new(endpoint, adapters))
}

/// Text of a fetched document. PDF bodies go through `pdf-extract` on the
/// blocking pool; anything else (or a PDF it cannot read) is decoded as UTF-8.
pub(crate) async fn document_text(body: Vec<u8>) -> Result<String, SourceError> {
    if !body.starts_with(b"%PDF") {
        return Ok(String::from_utf8_lossy(&body).into_owned());
    }
    tokio::task::spawn_blocking(move || match pdf_extract::extract_text_from_mem(&body) {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "pdf text extraction failed; falling back to utf8 decode");
            String::from_utf8_lossy(&body).into_owned()
        }
    })
    .await
    .map_err(|e| SourceError::Join(e.to_string()))
}

/// `href` joined onto `base` when it is site-relative.
pub(crate) fn absolute_url(base: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}
