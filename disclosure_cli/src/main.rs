mod cache;
mod commands;
mod output;
mod server;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use disclosure_lib::{Endpoint, ServiceConfig, TradeService};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "disclosure-feed")]
#[command(about = "Aggregate congressional and corporate-insider trade disclosures")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve /api/congress-trades and /api/insider-trades over HTTP
    Serve(commands::serve::ServeArgs),
    /// Fetch congressional trades once
    Congress(commands::report::ReportArgs),
    /// Fetch corporate-insider trades once
    Insider(commands::report::ReportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("disclosure=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    let config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    }
    .with_env_overrides();
    let service = TradeService::from_config(&config)?;

    match &cli.command {
        Commands::Serve(args) => commands::serve::run(args, service, &config).await?,
        Commands::Congress(args) => {
            commands::report::run(Endpoint::Congress, args, &service, &format).await?
        }
        Commands::Insider(args) => {
            commands::report::run(Endpoint::Insider, args, &service, &format).await?
        }
    }

    Ok(())
}
