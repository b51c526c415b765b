#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod report;

pub use cli::app::{Cli, Command};
pub use error::{ReportError, Result};
