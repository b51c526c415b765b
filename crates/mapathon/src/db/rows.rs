use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ReportError, Result};

pub type Record = Map<String, Value>;

/// Result of one statement: column names in select order plus row values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ReportError::SchemaMismatch {
                record: "row set",
                detail: format!(
                    "row {index} has {} values for {} columns",
                    row.len(),
                    columns.len()
                ),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Builds a row set from JSON objects; columns follow first-seen key
    /// order and missing keys become `null`.
    #[must_use]
    pub fn from_records(records: &[Record]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|column| column == key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<Record>()
            })
            .collect()
    }

    /// Decodes every row into `T`; a missing, unknown or mistyped column is a
    /// [`ReportError::SchemaMismatch`] naming `record`.
    pub fn decode<T>(&self, record: &'static str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.records()
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                serde_json::from_value::<T>(Value::Object(row)).map_err(|error| {
                    ReportError::SchemaMismatch {
                        record,
                        detail: format!("row {index}: {error}"),
                    }
                })
            })
            .collect()
    }

    /// Value of `column` in the single row of a scalar query.
    pub fn scalar(&self, column: &str) -> Result<&Value> {
        let Some(position) = self.columns.iter().position(|name| name == column) else {
            return Err(ReportError::SchemaMismatch {
                record: "scalar",
                detail: format!("column `{column}` not found in {:?}", self.columns),
            });
        };
        match self.rows.as_slice() {
            [row] => Ok(&row[position]),
            rows => Err(ReportError::SchemaMismatch {
                record: "scalar",
                detail: format!("expected exactly one row, got {}", rows.len()),
            }),
        }
    }
}
