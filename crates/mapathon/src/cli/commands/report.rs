use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::{print_json, read_request};
use crate::config::DatabaseCredentials;
use crate::db::{Database, Driver};
use crate::models::{ReportParameters, ReportRequest};

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// JSON file with `project_ids`, `hashtags`, `from_timestamp` and `to_timestamp`.
    #[arg(long, value_name = "FILE")]
    pub request: PathBuf,
}

pub fn load_parameters(args: &ReportArgs) -> Result<ReportParameters> {
    let request: ReportRequest = read_request(&args.request)?;
    let params = ReportParameters::try_from(request)
        .with_context(|| format!("invalid report request {}", args.request.display()))?;
    Ok(params)
}

pub fn run_summary<D: Driver>(
    args: &ReportArgs,
    driver: D,
    credentials: &DatabaseCredentials,
) -> Result<()> {
    let params = load_parameters(args)?;
    info!(
        projects = params.project_ids().len(),
        hashtags = params.hashtags().len(),
        "summary: start"
    );

    let mut database = Database::open(driver, credentials)?;
    let summary = crate::report::get_summary(&mut database, &params)
        .context("failed to build summary report")?;
    database.close()?;

    print_json(&summary)?;
    Ok(())
}

pub fn run_detail<D: Driver>(
    args: &ReportArgs,
    driver: D,
    credentials: &DatabaseCredentials,
) -> Result<()> {
    let params = load_parameters(args)?;
    info!(
        projects = params.project_ids().len(),
        hashtags = params.hashtags().len(),
        "detail: start"
    );

    let mut database = Database::open(driver, credentials)?;
    let detail = crate::report::get_detailed_report(&mut database, &params)
        .context("failed to build detailed report")?;
    database.close()?;

    print_json(&detail)?;
    Ok(())
}
