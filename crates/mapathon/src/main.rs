#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use mapathon::ReportError;
use mapathon::cli::app::{Cli, Command, RuntimeArgs};
use mapathon::cli::commands;
use mapathon::config::RuntimePaths;
use mapathon::db::PostgresDriver;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_INVALID_PARAMETERS: i32 = 2;
const EXIT_USAGE_ERROR: i32 = 64;

const LOG_ENV: &str = "MAPATHON_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    init_tracing();

    let command_name = command_name(&cli.command);
    info!(command = command_name, "starting");

    match execute(cli) {
        Ok(()) => {
            info!(command = command_name, exit_code = EXIT_SUCCESS, "completed");
            EXIT_SUCCESS
        }
        Err(failure) => {
            let exit_code = classify_runtime_error(&failure);
            let kind = failure
                .downcast_ref::<ReportError>()
                .map_or("runtime_error", ReportError::kind_key);
            error!(command = command_name, exit_code, kind, "failed");
            eprintln!("{failure:#}");
            exit_code
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    let credentials = cli.database.credentials();
    match cli.command {
        Command::Summary(args) => commands::report::run_summary(&args, PostgresDriver, &credentials),
        Command::Detail(args) => commands::report::run_detail(&args, PostgresDriver, &credentials),
        Command::DataQuality(args) => {
            commands::data_quality::run(&args, PostgresDriver, &credentials)
        }
        Command::Export(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::export::run(&args, &runtime_paths, PostgresDriver, &credentials)
        }
        Command::Schema(args) => commands::schema::run(&args),
    }
}

fn classify_runtime_error(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<ReportError>() {
        Some(ReportError::InvalidParameters(_)) => EXIT_INVALID_PARAMETERS,
        _ => EXIT_RUNTIME_FAILURE,
    }
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Summary(_) => "summary",
        Command::Detail(_) => "detail",
        Command::DataQuality(_) => "data-quality",
        Command::Export(_) => "export",
        Command::Schema(_) => "schema",
    }
}

fn resolve_runtime_paths(args: &RuntimeArgs) -> Result<RuntimePaths> {
    let home_dir = match &args.home_dir {
        Some(path) => path.clone(),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
    };

    let cwd = match &args.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    mapathon::config::resolve_runtime_paths(&home_dir, &cwd)
}
