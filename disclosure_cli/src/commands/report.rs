//! The `congress` and `insider` subcommands: run one endpoint once and print it.

use anyhow::Result;
use clap::Args;
use disclosure_lib::{Endpoint, ReportOptions, RequestContext, TradeService};

use crate::output::{print_json, print_report_table, OutputFormat};

#[derive(Args)]
pub struct ReportArgs {
    /// Maximum number of records (defaults to max_results from config)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Skip the per-ticker clustering
    #[arg(long)]
    pub no_cluster: bool,
}

pub async fn run(
    endpoint: Endpoint,
    args: &ReportArgs,
    service: &TradeService,
    format: &OutputFormat,
) -> Result<()> {
    let options = ReportOptions {
        limit: args.limit,
        cluster: !args.no_cluster,
    };
    let report = service
        .report(endpoint, options, &RequestContext::now())
        .await?;

    match format {
        OutputFormat::Table => print_report_table(&report),
        OutputFormat::Json => print_json(&report),
    }

    Ok(())
}
