//! The `serve` subcommand: expose both endpoints over HTTP.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Args;
use disclosure_lib::{ServiceConfig, TradeService};
use tracing::info;

use crate::cache::ResponseCache;
use crate::server::{router, AppState};

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,
}

pub async fn run(args: &ServeArgs, service: TradeService, config: &ServiceConfig) -> Result<()> {
    let cache = ResponseCache::from_ttl_secs(config.cache_ttl_secs);
    let app = router(AppState::new(service, cache));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(
        addr = %args.bind,
        cache_ttl_secs = config.cache_ttl_secs,
        "Listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
