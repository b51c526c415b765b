use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{
    data_quality::DataQualityArgs, export::ExportArgs, report::ReportArgs, schema::SchemaArgs,
};
use crate::config::{
    DEFAULT_DB_HOST, DEFAULT_DB_NAME, DEFAULT_DB_PORT, DEFAULT_DB_USER, DatabaseCredentials,
};

#[derive(Debug, Parser)]
#[command(
    name = "mapathon",
    version,
    about = "Mapathon contribution reports from OSM edit history"
)]
pub struct Cli {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct DatabaseArgs {
    #[arg(long, global = true, env = "PGHOST", default_value = DEFAULT_DB_HOST)]
    pub db_host: String,

    #[arg(long, global = true, env = "PGPORT", default_value_t = DEFAULT_DB_PORT)]
    pub db_port: u16,

    #[arg(long, global = true, env = "PGDATABASE", default_value = DEFAULT_DB_NAME)]
    pub db_name: String,

    #[arg(long, global = true, env = "PGUSER", default_value = DEFAULT_DB_USER)]
    pub db_user: String,

    #[arg(long, global = true, env = "PGPASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,
}

impl DatabaseArgs {
    #[must_use]
    pub fn credentials(&self) -> DatabaseCredentials {
        DatabaseCredentials {
            host: self.db_host.clone(),
            port: self.db_port,
            dbname: self.db_name.clone(),
            user: self.db_user.clone(),
            password: self.db_password.clone(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Feature counts and the number of contributors.
    Summary(ReportArgs),
    /// Per-user feature counts and contributor statistics.
    Detail(ReportArgs),
    /// Validation issues as a GeoJSON feature collection.
    DataQuality(DataQualityArgs),
    /// Raw report rows as json, list, dict or csv.
    Export(ExportArgs),
    /// JSON schema of a request or report.
    Schema(SchemaArgs),
}
