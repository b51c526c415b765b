use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::{print_json, read_request};
use crate::config::DatabaseCredentials;
use crate::db::{Database, Driver};
use crate::models::{DataQualityParameters, DataQualityRequest};

#[derive(Debug, Clone, Args)]
pub struct DataQualityArgs {
    /// JSON file with `project_ids` and `issue_types`.
    #[arg(long, value_name = "FILE")]
    pub request: PathBuf,
}

pub fn run<D: Driver>(
    args: &DataQualityArgs,
    driver: D,
    credentials: &DatabaseCredentials,
) -> Result<()> {
    let request: DataQualityRequest = read_request(&args.request)?;
    let params = DataQualityParameters::try_from(request)
        .with_context(|| format!("invalid data quality request {}", args.request.display()))?;
    info!(
        projects = params.project_ids().len(),
        statuses = ?params.statuses(),
        "data-quality: start"
    );

    let mut database = Database::open(driver, credentials)?;
    let report = crate::report::get_data_quality_report(&mut database, &params)
        .context("failed to build data quality report")?;
    database.close()?;

    print_json(&report)?;
    Ok(())
}
