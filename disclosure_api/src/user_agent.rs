//! Identifying user agent sent with every upstream request.
//!
//! SEC EDGAR rejects anonymous clients, so the default names the tool and a
//! contact address. Deployments are expected to override it.

pub const DEFAULT_USER_AGENT: &str = "disclosure-feed/0.3 (contact: ops@disclosure-feed.invalid)";

/// Returns the configured user agent, or the default when unset or blank.
pub fn get_user_agent(configured: Option<&str>) -> String {
    match configured.map(str::trim) {
        Some(ua) if !ua.is_empty() => ua.to_string(),
        _ => DEFAULT_USER_AGENT.to_string(),
    }
}
