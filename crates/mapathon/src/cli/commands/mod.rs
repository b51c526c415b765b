pub mod data_quality;
pub mod export;
pub mod report;
pub mod schema;

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ReportError, Result};

/// Reads and decodes a JSON request file. Malformed requests are reported as
/// invalid parameters.
pub fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text)
        .map_err(|error| ReportError::invalid(format!("request {}: {error}", path.display())))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| ReportError::Serialization(error.to_string()))?;
    println!("{rendered}");
    Ok(())
}
