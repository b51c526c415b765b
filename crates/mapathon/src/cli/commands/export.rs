use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use super::report::{ReportArgs, load_parameters};
use crate::config::{DatabaseCredentials, RuntimePaths};
use crate::db::{Database, Driver};
use crate::error::ReportError;
use crate::query::{ChangesetQuery, Statement, history_query, users_contributions_query};
use crate::report::{Output, OutputSource, QueryRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    /// Feature counts across all contributors.
    Summary,
    /// Per-contributor statistics.
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    List,
    Dict,
    Csv,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[arg(long, value_enum, default_value_t = ExportKind::Summary)]
    pub kind: ExportKind,

    #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
    pub format: ExportFormat,

    /// Destination file; required for `csv`.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

pub fn run<D: Driver>(
    args: &ExportArgs,
    runtime_paths: &RuntimePaths,
    driver: D,
    credentials: &DatabaseCredentials,
) -> Result<()> {
    let params = load_parameters(&args.report)?;
    let out = args
        .out
        .as_deref()
        .map(|path| runtime_paths.resolve_output_path(path))
        .transpose()?;
    if args.format == ExportFormat::Csv && out.is_none() {
        return Err(ReportError::invalid("csv export needs --out").into());
    }

    let changesets = ChangesetQuery::new(&params)?;
    let statement: Statement = match args.kind {
        ExportKind::Summary => history_query(&changesets, false),
        ExportKind::Detail => users_contributions_query(&params, &changesets),
    };

    let mut database = Database::open(driver, credentials)?;
    let runner: &mut dyn QueryRunner = &mut database;
    let output = Output::load(OutputSource::Query(statement), Some(runner))
        .context("failed to load export rows")?;
    database.close()?;

    let rendered = match args.format {
        ExportFormat::Json => output.to_json()?,
        ExportFormat::List => to_json(&output.to_list())?,
        ExportFormat::Dict => to_json(&output.to_dict())?,
        ExportFormat::Csv => {
            if let Some(path) = &out {
                output.to_csv(path)?;
                info!(rows = output.table().len(), path = %path.display(), "export: csv written");
            }
            return Ok(());
        }
    };

    match out {
        Some(path) => {
            std::fs::write(&path, format!("{rendered}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(rows = output.table().len(), path = %path.display(), "export: written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|error| ReportError::Serialization(error.to_string()).into())
}
